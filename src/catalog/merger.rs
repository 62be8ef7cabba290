//! Merge N ordered source catalogs into one de-duplicated catalog.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::catalog::index::IntervalIndex;
use crate::core::error::CatalogError;
use crate::core::locus::{derive_locus_id, Locus};
use crate::core::types::OverlapPolicy;

/// Per-source accounting produced by a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub name: String,
    /// Loci from this source that define an entry in the merged catalog.
    pub accepted: usize,
    /// Loci from this source discarded (or absorbed, under the merging
    /// policy) because a compatible definition already existed.
    pub discarded_as_duplicate: usize,
}

/// The merged, de-duplicated catalog plus per-source counts.
#[derive(Debug)]
pub struct MergedCatalog {
    pub loci: Vec<Locus>,
    pub source_stats: Vec<SourceStats>,
}

impl MergedCatalog {
    /// Loci whose `found_in` names only the given source.
    #[must_use]
    pub fn unique_to(&self, source: &str) -> Vec<&Locus> {
        self.loci
            .iter()
            .filter(|locus| locus.found_in.len() == 1 && locus.found_in[0] == source)
            .collect()
    }
}

/// Merges ordered catalogs, resolving same-motif overlaps by source
/// precedence.
#[derive(Debug, Default)]
pub struct CatalogMerger {
    policy: OverlapPolicy,
}

impl CatalogMerger {
    #[must_use]
    pub fn new(policy: OverlapPolicy) -> Self {
        Self { policy }
    }

    /// Merge catalogs given in precedence order (lower index wins overlaps).
    ///
    /// # Errors
    ///
    /// Propagates `CatalogError::InvalidInterval` from the index for loci
    /// that bypassed normalization; the merger performs no re-validation of
    /// its own.
    pub fn merge(&self, catalogs: &[(String, Vec<Locus>)]) -> Result<MergedCatalog, CatalogError> {
        let merged = match self.policy {
            OverlapPolicy::KeepFirst => self.merge_keep_first(catalogs),
            OverlapPolicy::MergeAdjacentSameMotif => self.merge_adjacent(catalogs),
        }?;

        for stats in &merged.source_stats {
            info!(
                "{}: accepted {} loci, discarded {} as duplicates",
                stats.name, stats.accepted, stats.discarded_as_duplicate
            );
        }
        Ok(merged)
    }

    fn merge_keep_first(
        &self,
        catalogs: &[(String, Vec<Locus>)],
    ) -> Result<MergedCatalog, CatalogError> {
        let mut accepted: Vec<Locus> = Vec::new();
        let mut index: IntervalIndex<usize> = IntervalIndex::new();
        let mut source_stats = Vec::with_capacity(catalogs.len());

        for (name, loci) in catalogs {
            let mut stats = SourceStats {
                name: name.clone(),
                accepted: 0,
                discarded_as_duplicate: 0,
            };
            debug!("Merging {} loci from {}", loci.len(), name);

            for candidate in loci {
                let winner = index
                    .query(&candidate.chrom, candidate.start, candidate.end)
                    .map(|iv| iv.val)
                    .find(|&i| accepted[i].canonical_motif == candidate.canonical_motif);

                match winner {
                    Some(i) => {
                        // An earlier catalog (or an earlier locus of this
                        // one) already defines this repeat; record the source
                        // on the winner instead of inserting.
                        let winner = &mut accepted[i];
                        if !winner.found_in.iter().any(|s| s == name) {
                            winner.found_in.push(name.clone());
                        }
                        stats.discarded_as_duplicate += 1;
                    }
                    None => {
                        let i = accepted.len();
                        index.insert(&candidate.chrom, candidate.start, candidate.end, i)?;
                        let mut locus = candidate.clone();
                        locus.source = name.clone();
                        locus.found_in = vec![name.clone()];
                        accepted.push(locus);
                        stats.accepted += 1;
                    }
                }
            }
            source_stats.push(stats);
        }

        Ok(MergedCatalog {
            loci: accepted,
            source_stats,
        })
    }

    fn merge_adjacent(
        &self,
        catalogs: &[(String, Vec<Locus>)],
    ) -> Result<MergedCatalog, CatalogError> {
        // Flatten with precedence rank, then sweep each (chrom, canonical
        // motif) group in coordinate order, chaining touching or overlapping
        // loci into union intervals.
        let mut groups: HashMap<(String, String), Vec<(usize, usize, Locus)>> = HashMap::new();
        for (rank, (name, loci)) in catalogs.iter().enumerate() {
            for (pos, locus) in loci.iter().enumerate() {
                let mut locus = locus.clone();
                locus.found_in = vec![name.clone()];
                locus.source = name.clone();
                groups
                    .entry((locus.chrom.clone(), locus.canonical_motif.clone()))
                    .or_default()
                    .push((rank, pos, locus));
            }
        }

        let mut stats_by_rank: Vec<SourceStats> = catalogs
            .iter()
            .map(|(name, _)| SourceStats {
                name: name.clone(),
                accepted: 0,
                discarded_as_duplicate: 0,
            })
            .collect();

        let mut merged: Vec<Locus> = Vec::new();
        let mut keys: Vec<&(String, String)> = groups.keys().collect();
        keys.sort();
        let keys: Vec<(String, String)> = keys.into_iter().cloned().collect();

        for key in keys {
            let mut group = groups.remove(&key).unwrap_or_default();
            group.sort_by_key(|(rank, pos, locus)| (locus.start, locus.end, *rank, *pos));

            let mut chain: Vec<(usize, usize, Locus)> = Vec::new();
            let mut chain_end = 0u64;
            for entry in group {
                if chain.is_empty() || entry.2.start <= chain_end {
                    chain_end = chain_end.max(entry.2.end);
                    chain.push(entry);
                } else {
                    merged.push(Self::union_chain(&chain, &mut stats_by_rank, catalogs));
                    chain_end = entry.2.end;
                    chain = vec![entry];
                }
            }
            if !chain.is_empty() {
                merged.push(Self::union_chain(&chain, &mut stats_by_rank, catalogs));
            }
        }

        merged.sort_by(|a, b| (&a.chrom, a.start, a.end).cmp(&(&b.chrom, b.start, b.end)));
        Ok(MergedCatalog {
            loci: merged,
            source_stats: stats_by_rank,
        })
    }

    fn union_chain(
        chain: &[(usize, usize, Locus)],
        stats: &mut [SourceStats],
        catalogs: &[(String, Vec<Locus>)],
    ) -> Locus {
        let (winner_rank, winner_pos, winner) = chain
            .iter()
            .min_by_key(|(rank, pos, _)| (*rank, *pos))
            .expect("chains are never empty");

        let start = chain.iter().map(|(_, _, l)| l.start).min().unwrap_or(winner.start);
        let end = chain.iter().map(|(_, _, l)| l.end).max().unwrap_or(winner.end);

        let mut locus = winner.clone();
        locus.start = start;
        locus.end = end;
        if (start, end) != winner.interval() {
            locus.id = derive_locus_id(&locus.chrom, start, end, &locus.motif);
            locus.structure = format!("({})*", locus.motif);
        }

        // found_in in precedence order over the contributing sources
        let mut ranks: Vec<usize> = chain.iter().map(|(rank, _, _)| *rank).collect();
        ranks.sort_unstable();
        ranks.dedup();
        locus.found_in = ranks.iter().map(|&r| catalogs[r].0.clone()).collect();

        stats[*winner_rank].accepted += 1;
        for (rank, pos, _) in chain {
            if (rank, pos) != (winner_rank, winner_pos) {
                stats[*rank].discarded_as_duplicate += 1;
            }
        }

        locus
    }
}
