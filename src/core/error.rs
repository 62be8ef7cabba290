use thiserror::Error;

/// Errors produced while loading, merging, classifying, or annotating catalogs.
///
/// Per-record errors are fatal for the whole catalog load: a malformed interval
/// or id signals upstream data corruption, so no partial catalog is ever
/// emitted. Recoverable conditions (a boundary adjustment producing a negative
/// repeat count) are counted in join statistics instead of surfacing here.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid interval {chrom}:{start}-{end}: end must be greater than start")]
    InvalidInterval { chrom: String, start: u64, end: u64 },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("unexpected locus id format: '{0}'")]
    UnexpectedIdFormat(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invariant violated: {0}")]
    AssertionViolation(String),
}
