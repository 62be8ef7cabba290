//! Command-line interface for tr-catalog.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **merge**: merge ordered source catalogs into one de-duplicated catalog
//! - **compare**: classify locus correspondence between two catalogs
//! - **annotate**: attach allele-frequency, LPS, and variation-cluster fields
//! - **stats**: summarize a catalog's contents
//!
//! ## Usage
//!
//! ```text
//! # Merge catalogs in precedence order (earlier wins overlaps)
//! tr-catalog merge KnownDiseaseAssociatedLoci:disease.json Illumina174k:catalog.bed.gz \
//!     --output-prefix repeat_catalog --write-outer-join-table
//!
//! # Compare two catalogs
//! tr-catalog compare catalog_a.json.gz catalog_b.json.gz --format tsv
//!
//! # Attach allele frequencies with overlap fallback
//! tr-catalog annotate merged.json --allele-frequencies 1kg.hist.tsv.gz \
//!     --allow-overlap-fallback --adjust-boundaries
//! ```

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::catalog::known::KnownLociLookup;
use crate::core::error::CatalogError;
use crate::core::locus::Locus;
use crate::parsing::{bed, json};

pub mod annotate;
pub mod compare;
pub mod merge;
pub mod stats;

#[derive(Parser)]
#[command(name = "tr-catalog")]
#[command(version)]
#[command(about = "Merge, compare, and annotate tandem repeat catalogs")]
#[command(
    long_about = "tr-catalog builds a genome-wide tandem repeat catalog out of heterogeneous source catalogs.\n\nSources are normalized into a common locus representation, merged in precedence order (overlapping same-motif definitions resolve to the earlier catalog), classified against each other, and annotated with per-locus allele-frequency, longest-pure-segment, and variation-cluster data."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge ordered source catalogs into one catalog
    Merge(merge::MergeArgs),

    /// Classify locus correspondence between two catalogs
    Compare(compare::CompareArgs),

    /// Attach per-locus annotations from side tables
    Annotate(annotate::AnnotateArgs),

    /// Summarize a catalog
    Stats(stats::StatsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load a catalog file by format: ExpansionHunter-style JSON or BED rows,
/// either optionally gzip-compressed. Compound records are split into their
/// standalone parts.
pub(crate) fn load_catalog_file(
    path: &Path,
    known: &KnownLociLookup,
    source: &str,
) -> Result<Vec<Locus>, CatalogError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".json") || name.ends_with(".json.gz") {
        json::read_catalog(path, known, source, json::CompoundHandling::Split)
    } else if name.ends_with(".bed") || name.ends_with(".bed.gz") {
        bed::read_bed_catalog(path, source)
    } else {
        Err(CatalogError::InvalidFormat(format!(
            "unsupported catalog file extension: {}",
            path.display()
        )))
    }
}

/// Load the known disease-associated loci lookup, or an empty one when no
/// path was given.
pub(crate) fn load_known(path: Option<&Path>) -> Result<KnownLociLookup, CatalogError> {
    match path {
        Some(path) => KnownLociLookup::load(path),
        None => Ok(KnownLociLookup::default()),
    }
}
