use std::collections::HashMap;

use rust_lapper::{Interval, Lapper};

use crate::core::error::CatalogError;

/// Per-chromosome interval index over half-open genomic ranges.
///
/// Each chromosome gets its own `Lapper`; there is no cross-chromosome
/// structure, which keeps genome-wide indices over tens of millions of
/// intervals within practical memory. Payloads are typically indices into a
/// locus vector rather than the loci themselves.
pub struct IntervalIndex<T: Eq + Clone + Send + Sync> {
    trees: HashMap<String, Lapper<u64, T>>,
    len: usize,
}

impl<T: Eq + Clone + Send + Sync> std::fmt::Debug for IntervalIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalIndex")
            .field("chromosomes", &self.trees.len())
            .field("intervals", &self.len)
            .finish()
    }
}

impl<T: Eq + Clone + Send + Sync> IntervalIndex<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            len: 0,
        }
    }

    /// Insert `[start, end)` on `chrom` with an attached payload.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInterval` if `end <= start`; degenerate
    /// intervals signal upstream data corruption and must not be indexed.
    pub fn insert(&mut self, chrom: &str, start: u64, end: u64, val: T) -> Result<(), CatalogError> {
        if end <= start {
            return Err(CatalogError::InvalidInterval {
                chrom: chrom.to_string(),
                start,
                end,
            });
        }

        self.trees
            .entry(chrom.to_string())
            .or_insert_with(|| Lapper::new(Vec::new()))
            .insert(Interval {
                start,
                stop: end,
                val,
            });
        self.len += 1;
        Ok(())
    }

    /// All payload-carrying intervals intersecting `[start, end)` on `chrom`,
    /// in arbitrary order. Unknown chromosomes yield nothing.
    pub fn query(&self, chrom: &str, start: u64, end: u64) -> impl Iterator<Item = &Interval<u64, T>> {
        self.trees
            .get(chrom)
            .into_iter()
            .flat_map(move |lapper| lapper.find(start, end))
    }

    /// Total number of indexed intervals across all chromosomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct chromosomes with at least one interval.
    #[must_use]
    pub fn chrom_count(&self) -> usize {
        self.trees.len()
    }
}

impl<T: Eq + Clone + Send + Sync> Default for IntervalIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_vals(index: &IntervalIndex<u32>, chrom: &str, start: u64, end: u64) -> Vec<u32> {
        let mut vals: Vec<u32> = index.query(chrom, start, end).map(|iv| iv.val).collect();
        vals.sort_unstable();
        vals
    }

    #[test]
    fn test_insert_and_query_overlaps() {
        let mut index = IntervalIndex::new();
        index.insert("1", 100, 200, 1u32).unwrap();
        index.insert("1", 150, 300, 2).unwrap();
        index.insert("1", 400, 500, 3).unwrap();

        assert_eq!(collect_vals(&index, "1", 180, 250), vec![1, 2]);
        assert_eq!(collect_vals(&index, "1", 450, 460), vec![3]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_half_open_boundaries_do_not_touch() {
        let mut index = IntervalIndex::new();
        index.insert("1", 100, 200, 1u32).unwrap();

        assert!(collect_vals(&index, "1", 200, 300).is_empty());
        assert!(collect_vals(&index, "1", 0, 100).is_empty());
        assert_eq!(collect_vals(&index, "1", 199, 200), vec![1]);
    }

    #[test]
    fn test_chromosomes_are_partitioned() {
        let mut index = IntervalIndex::new();
        index.insert("1", 100, 200, 1u32).unwrap();
        index.insert("2", 100, 200, 2).unwrap();

        assert_eq!(collect_vals(&index, "1", 100, 200), vec![1]);
        assert_eq!(collect_vals(&index, "2", 100, 200), vec![2]);
        assert!(collect_vals(&index, "X", 100, 200).is_empty());
        assert_eq!(index.chrom_count(), 2);
    }

    #[test]
    fn test_degenerate_interval_is_rejected() {
        let mut index: IntervalIndex<u32> = IntervalIndex::new();
        assert!(matches!(
            index.insert("1", 100, 100, 1).unwrap_err(),
            CatalogError::InvalidInterval { .. }
        ));
        assert!(index.insert("1", 100, 50, 1).is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn test_incremental_insert_between_queries() {
        let mut index = IntervalIndex::new();
        index.insert("1", 100, 110, 1u32).unwrap();
        assert!(collect_vals(&index, "1", 105, 120).contains(&1));

        index.insert("1", 105, 120, 2).unwrap();
        assert_eq!(collect_vals(&index, "1", 105, 120), vec![1, 2]);
    }
}
