//! Locus correspondence between catalogs: pairwise classification and the
//! multi-catalog outer-join table.

pub mod classifier;
pub mod outer_join;
