//! # tr-catalog
//!
//! A library for building and curating genome-wide tandem repeat (TR)
//! catalogs.
//!
//! Source catalogs of TR loci come in many shapes: disease-association
//! lists, population-polymorphism catalogs, reference-derived perfect-repeat
//! scans, and third-party tool catalogs in assorted formats. `tr-catalog`
//! normalizes them into a common locus representation, merges them into one
//! de-duplicated catalog under a source-precedence policy, classifies how
//! locus definitions correspond between catalogs, and attaches per-locus
//! side-table annotations (allele-frequency histograms, longest-pure-segment
//! statistics, variation-cluster boundaries).
//!
//! ## Example
//!
//! ```rust
//! use tr_catalog::{CatalogMerger, Locus, OverlapPolicy};
//!
//! let a = vec![Locus::new("chr1", 100, 110, "CAG", "A").unwrap()];
//! let b = vec![Locus::new("chr1", 105, 120, "CAG", "B").unwrap()];
//!
//! // A comes first, so its definition of the overlapping CAG repeat wins
//! let merged = CatalogMerger::new(OverlapPolicy::KeepFirst)
//!     .merge(&[("A".to_string(), a), ("B".to_string(), b)])
//!     .unwrap();
//!
//! assert_eq!(merged.loci.len(), 1);
//! assert_eq!(merged.loci[0].found_in, vec!["A", "B"]);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: interval index, catalog store, known-loci lookup, merger
//! - [`core`]: locus data model, interval relations, error taxonomy
//! - [`matching`]: pairwise overlap classification and outer-join tables
//! - [`annotation`]: allele-frequency, LPS, and variation-cluster joins
//! - [`parsing`]: JSON/BED/TSV readers and writers
//! - [`cli`]: command-line interface implementation

pub mod annotation;
pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::annotation::histogram::AlleleHistogram;
pub use crate::annotation::joiner::{AnnotationJoiner, FrequencyTable, JoinStats, JoinStrategy};
pub use crate::catalog::index::IntervalIndex;
pub use crate::catalog::known::KnownLociLookup;
pub use crate::catalog::merger::{CatalogMerger, MergedCatalog, SourceStats};
pub use crate::catalog::store::LocusCatalog;
pub use crate::core::error::CatalogError;
pub use crate::core::locus::Locus;
pub use crate::core::types::{OverlapPolicy, OverlapStatus};
pub use crate::matching::classifier::{OverlapClassifier, OverlapRecord};
pub use crate::matching::outer_join::OuterJoinTable;
