//! Allele-frequency histograms keyed by repeat-unit count.

use std::collections::BTreeMap;

use crate::core::error::CatalogError;

/// Number of alleles observed per repeat count at one locus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlleleHistogram {
    counts: BTreeMap<u32, u64>,
}

impl AlleleHistogram {
    #[must_use]
    pub fn new(counts: BTreeMap<u32, u64>) -> Self {
        Self { counts }
    }

    /// Build from paired comma-separated `RepeatNumbers`/`AlleleCounts`
    /// columns.
    ///
    /// # Errors
    ///
    /// `CatalogError::SchemaMismatch` when the two lists differ in length or
    /// contain non-numeric entries.
    pub fn from_paired_strings(
        repeat_numbers: &str,
        allele_counts: &str,
    ) -> Result<Self, CatalogError> {
        let repeats: Vec<&str> = repeat_numbers.split(',').collect();
        let counts: Vec<&str> = allele_counts.split(',').collect();
        if repeats.len() != counts.len() {
            return Err(CatalogError::SchemaMismatch(format!(
                "RepeatNumbers and AlleleCounts have different lengths: \
                 {} vs {}",
                repeats.len(),
                counts.len()
            )));
        }

        let mut histogram = BTreeMap::new();
        for (repeat, count) in repeats.iter().zip(&counts) {
            let repeat: u32 = repeat.trim().parse().map_err(|_| {
                CatalogError::SchemaMismatch(format!("invalid repeat number '{repeat}'"))
            })?;
            let count: u64 = count.trim().parse().map_err(|_| {
                CatalogError::SchemaMismatch(format!("invalid allele count '{count}'"))
            })?;
            *histogram.entry(repeat).or_insert(0) += count;
        }
        Ok(Self { counts: histogram })
    }

    /// Catalog string form: `"12x:8,13x:152"`, ordered by repeat count.
    #[must_use]
    pub fn to_catalog_string(&self) -> String {
        self.counts
            .iter()
            .map(|(repeat, count)| format!("{repeat}x:{count}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Total number of alleles.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Population standard deviation of the repeat count, in repeat units.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stdev(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        let mean = self
            .counts
            .iter()
            .map(|(&repeat, &count)| f64::from(repeat) * count as f64)
            .sum::<f64>()
            / total;
        let variance = self
            .counts
            .iter()
            .map(|(&repeat, &count)| (f64::from(repeat) - mean).powi(2) * count as f64)
            .sum::<f64>()
            / total;
        variance.sqrt()
    }

    /// The repeat count at the given upper percentile: walking buckets from
    /// the highest repeat count downward, the first one at which the
    /// remaining allele total drops to `total * percentile` or below.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentile(&self, percentile: f64) -> Option<u32> {
        let mut remaining = self.total() as f64;
        let cutoff = remaining * percentile;
        for (&repeat, &count) in self.counts.iter().rev() {
            remaining -= count as f64;
            if remaining <= cutoff {
                return Some(repeat);
            }
        }
        None
    }

    /// Shift every repeat count down by `shift` (which may be negative).
    /// Returns `None` when any adjusted count would go negative, which means
    /// the size correction is incompatible and the histogram must be
    /// discarded.
    #[must_use]
    pub fn adjust(&self, shift: i64) -> Option<Self> {
        let mut adjusted = BTreeMap::new();
        for (&repeat, &count) in &self.counts {
            let new_repeat = i64::from(repeat) - shift;
            if new_repeat < 0 {
                return None;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let new_repeat = new_repeat as u32;
            *adjusted.entry(new_repeat).or_insert(0) += count;
        }
        Some(Self { counts: adjusted })
    }
}
