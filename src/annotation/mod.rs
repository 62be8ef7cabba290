//! Per-locus side-table annotations: allele-frequency histograms, longest
//! pure segment statistics, and variation-cluster boundaries.

pub mod clusters;
pub mod histogram;
pub mod joiner;
pub mod lps;
