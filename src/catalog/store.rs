use std::collections::HashMap;

use crate::core::error::CatalogError;
use crate::core::locus::Locus;
use crate::core::types::overlap_size;
use crate::catalog::index::IntervalIndex;

/// One source catalog with lookup indexes: loci in input order, an id map,
/// and a per-chromosome interval index.
///
/// Built once per catalog load; queries are read-only afterwards.
#[derive(Debug)]
pub struct LocusCatalog {
    pub name: String,
    pub loci: Vec<Locus>,
    id_to_index: HashMap<String, usize>,
    interval_index: IntervalIndex<usize>,
}

impl LocusCatalog {
    /// Index a catalog's loci. Duplicate ids within one catalog are
    /// considered identical definitions; the first occurrence wins.
    ///
    /// # Errors
    ///
    /// Propagates `CatalogError::InvalidInterval` for loci that bypassed
    /// normalization with degenerate coordinates.
    pub fn new(name: &str, loci: Vec<Locus>) -> Result<Self, CatalogError> {
        let mut id_to_index = HashMap::with_capacity(loci.len());
        let mut interval_index = IntervalIndex::new();

        for (i, locus) in loci.iter().enumerate() {
            id_to_index.entry(locus.id.clone()).or_insert(i);
            interval_index.insert(&locus.chrom, locus.start, locus.end, i)?;
        }

        Ok(Self {
            name: name.to_string(),
            loci,
            id_to_index,
            interval_index,
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Locus> {
        self.id_to_index.get(id).map(|&i| &self.loci[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loci.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    /// Find this catalog's definition of `locus`: the exact id when present,
    /// otherwise the same-chromosome locus with a matching canonical motif
    /// whose overlap with `locus` is at least `overlap_fraction` of the
    /// smaller interval. Among several qualifying candidates the largest
    /// overlap wins, ties broken by lowest start.
    #[must_use]
    pub fn find_candidate(&self, locus: &Locus, overlap_fraction: f64) -> Option<&Locus> {
        if let Some(exact) = self.get(&locus.id) {
            return Some(exact);
        }

        let mut candidates: Vec<(&Locus, u64)> = self
            .interval_index
            .query(&locus.chrom, locus.start, locus.end)
            .map(|iv| &self.loci[iv.val])
            .filter(|c| c.canonical_motif == locus.canonical_motif)
            .map(|c| (c, overlap_size(locus.interval(), c.interval())))
            .filter(|(c, overlap)| {
                let smaller = locus.len().min(c.len());
                #[allow(clippy::cast_precision_loss)]
                let enough = *overlap as f64 >= overlap_fraction * smaller as f64;
                enough
            })
            .collect();

        candidates.sort_by(|(a, ov_a), (b, ov_b)| {
            ov_b.cmp(ov_a).then(a.start.cmp(&b.start)).then(a.end.cmp(&b.end))
        });
        candidates.first().map(|(c, _)| *c)
    }
}
