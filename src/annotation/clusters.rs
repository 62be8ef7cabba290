//! Variation-cluster annotations.
//!
//! A variation cluster is a region where TR boundaries vary across samples,
//! often spanning several simple loci. The cluster catalog is a BED file
//! whose info column lists the member locus ids; clusters that barely move
//! the original boundaries are not worth annotating and are skipped.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::catalog::known::KnownLociLookup;
use crate::core::error::CatalogError;
use crate::core::locus::Locus;
use crate::parsing::bed::read_info_bed;
use crate::utils::motif::strip_chr;

/// A cluster must move at least one boundary by this many bases before it is
/// attached to a locus.
pub const MIN_BOUNDARY_CHANGE: u64 = 6;

/// Cluster assignment for one locus id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAnnotation {
    /// Cluster region as `chrom:start0-end1`, chr-stripped.
    pub region: String,
    /// `|Δstart| + |Δend|` versus the original locus boundaries.
    pub size_diff: u64,
}

/// Counters reported after loading a cluster catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterStats {
    pub clusters: usize,
    pub member_locus_ids: usize,
    /// Cluster/locus pairs skipped because neither boundary moved by at
    /// least [`MIN_BOUNDARY_CHANGE`] bases.
    pub below_boundary_threshold: usize,
}

/// Variation-cluster annotations keyed by locus id.
#[derive(Debug, Default)]
pub struct VariationClusters {
    by_locus_id: HashMap<String, ClusterAnnotation>,
    pub stats: ClusterStats,
}

impl VariationClusters {
    /// Load a variation-cluster BED file. Column 4 must carry an `ID` info
    /// field listing the member locus ids, comma-separated; each id resolves
    /// through `known` or parses as `chrom-start0-end1-motif`.
    ///
    /// # Errors
    ///
    /// `CatalogError::UnexpectedIdFormat` for unresolvable member ids (the
    /// boundary comparison needs the original coordinates), and
    /// `CatalogError::InvalidFormat` for rows without an `ID` field.
    pub fn load(path: &Path, known: &KnownLociLookup) -> Result<Self, CatalogError> {
        let mut clusters = Self::default();

        for record in read_info_bed(path)? {
            clusters.stats.clusters += 1;
            let ids = record.info.get("ID").ok_or_else(|| {
                CatalogError::InvalidFormat(format!(
                    "variation cluster {}:{}-{} has no ID info field",
                    record.chrom, record.start, record.end
                ))
            })?;

            let region = format!("{}:{}-{}", strip_chr(&record.chrom), record.start, record.end);
            for locus_id in ids.split(',') {
                clusters.stats.member_locus_ids += 1;
                let original = known.resolve_or_parse(locus_id)?;

                let start_diff = record.start.abs_diff(original.start);
                let end_diff = record.end.abs_diff(original.end);
                if start_diff < MIN_BOUNDARY_CHANGE && end_diff < MIN_BOUNDARY_CHANGE {
                    clusters.stats.below_boundary_threshold += 1;
                    debug!(
                        "variation cluster {region} changes locus {locus_id} by \
                         less than {MIN_BOUNDARY_CHANGE}bp on both ends"
                    );
                    continue;
                }

                clusters.by_locus_id.insert(
                    locus_id.to_string(),
                    ClusterAnnotation {
                        region: region.clone(),
                        size_diff: start_diff + end_diff,
                    },
                );
            }
        }

        info!(
            "Parsed {} variation clusters covering {} locus ids ({} below the \
             {}bp boundary-change threshold)",
            clusters.stats.clusters,
            clusters.stats.member_locus_ids,
            clusters.stats.below_boundary_threshold,
            MIN_BOUNDARY_CHANGE
        );
        Ok(clusters)
    }

    #[must_use]
    pub fn get(&self, locus_id: &str) -> Option<&ClusterAnnotation> {
        self.by_locus_id.get(locus_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_locus_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_locus_id.is_empty()
    }

    /// Attach `VariationCluster`/`VariationClusterSizeDiff` by exact locus
    /// id; unmatched loci pass through. Returns new loci and the number
    /// annotated.
    #[must_use]
    pub fn annotate(&self, loci: &[Locus]) -> (Vec<Locus>, usize) {
        let mut annotated = 0usize;
        let out = loci
            .iter()
            .map(|locus| match self.by_locus_id.get(&locus.id) {
                Some(cluster) => {
                    annotated += 1;
                    locus
                        .with_annotation("VariationCluster", cluster.region.clone().into())
                        .with_annotation("VariationClusterSizeDiff", cluster.size_diff.into())
                }
                None => locus.clone(),
            })
            .collect();
        info!(
            "Annotated {annotated} out of {} loci with variation clusters",
            loci.len()
        );
        (out, annotated)
    }
}
