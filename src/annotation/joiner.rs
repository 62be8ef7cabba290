//! Attach allele-frequency histograms to catalog loci.
//!
//! Exact `(chrom, start, end)` lookups come first; an optional fallback
//! searches the table's per-chromosome interval index for an overlapping
//! entry with the same canonical motif, correcting the histogram for the
//! boundary difference when requested.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::annotation::histogram::AlleleHistogram;
use crate::catalog::index::IntervalIndex;
use crate::core::error::CatalogError;
use crate::core::locus::Locus;
use crate::core::types::overlap_size;
use crate::parsing::table::Table;
use crate::utils::motif::{canonical_motif, strip_chr};

/// One row of an allele-frequency table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// Canonical motif, when the table provides one. Entries without it are
    /// reachable only through exact lookup, never through the fallback.
    pub canonical_motif: Option<String>,
    pub histogram: AlleleHistogram,
}

impl FrequencyEntry {
    fn len(&self) -> u64 {
        self.end - self.start
    }
}

/// Allele-frequency table with an exact-key map and a per-chromosome
/// interval index for fallback lookups.
#[derive(Debug, Default)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
    exact: HashMap<(String, u64, u64), usize>,
    index: IntervalIndex<usize>,
}

impl FrequencyTable {
    /// Load from a TSV with columns `VariantId` (`chrom_start0_end1`),
    /// `RepeatNumbers`, `AlleleCounts`, and optionally `CanonicalMotif`.
    ///
    /// # Errors
    ///
    /// `CatalogError::InvalidFormat` for missing columns or malformed
    /// variant ids; `CatalogError::SchemaMismatch` when the paired histogram
    /// columns disagree.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let table = Table::read(path)?;
        table.require_columns(path, &["VariantId", "RepeatNumbers", "AlleleCounts"])?;

        let mut loaded = Self::default();
        for row in table.rows() {
            let variant_id = table.get(row, "VariantId").unwrap_or_default();
            let (chrom, start, end) = parse_variant_id(variant_id)?;
            let histogram = AlleleHistogram::from_paired_strings(
                table.get(row, "RepeatNumbers").unwrap_or_default(),
                table.get(row, "AlleleCounts").unwrap_or_default(),
            )?;
            let motif = table
                .get(row, "CanonicalMotif")
                .filter(|m| !m.is_empty())
                .map(|m| canonical_motif(m));
            loaded.insert(&chrom, start, end, motif, histogram)?;
        }
        info!("Loaded {} allele frequency records from {}", loaded.entries.len(), path.display());
        Ok(loaded)
    }

    /// Register one entry. Entries with a motif and a non-degenerate
    /// interval also go into the fallback index.
    ///
    /// # Errors
    ///
    /// Propagates `CatalogError::InvalidInterval` from the index.
    pub fn insert(
        &mut self,
        chrom: &str,
        start: u64,
        end: u64,
        canonical_motif: Option<String>,
        histogram: AlleleHistogram,
    ) -> Result<(), CatalogError> {
        let chrom = strip_chr(chrom).to_string();
        let i = self.entries.len();
        if canonical_motif.is_some() && end > start {
            self.index.insert(&chrom, start, end, i)?;
        }
        self.exact.insert((chrom.clone(), start, end), i);
        self.entries.push(FrequencyEntry {
            chrom,
            start,
            end,
            canonical_motif,
            histogram,
        });
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn exact_match(&self, locus: &Locus) -> Option<&FrequencyEntry> {
        self.exact
            .get(&(locus.chrom.clone(), locus.start, locus.end))
            .map(|&i| &self.entries[i])
    }

    /// First overlapping same-motif entry, rejecting candidates whose
    /// overlap with the locus spans less than `2 * motif_len` bases when
    /// both intervals are at least that long (prevents spurious matches
    /// between short, barely-touching intervals).
    fn overlap_match(&self, locus: &Locus) -> Option<&FrequencyEntry> {
        let motif_len = locus.motif.len() as u64;
        let mut candidates: Vec<&FrequencyEntry> = self
            .index
            .query(&locus.chrom, locus.start, locus.end)
            .map(|iv| &self.entries[iv.val])
            .filter(|entry| entry.canonical_motif.as_deref() == Some(locus.canonical_motif.as_str()))
            .filter(|entry| {
                let overlap = overlap_size(locus.interval(), (entry.start, entry.end));
                !(entry.len() >= 2 * motif_len
                    && locus.len() >= 2 * motif_len
                    && overlap < 2 * motif_len)
            })
            .collect();
        candidates.sort_by_key(|entry| (entry.start, entry.end));
        candidates.first().copied()
    }
}

/// Controls for the fallback lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinStrategy {
    /// Permit interval-overlap fallback when the exact key misses.
    pub allow_overlap_fallback: bool,
    /// On a fallback match, shift the histogram by the boundary difference
    /// and attach it (discarded when any repeat count would go negative).
    pub adjust_boundaries: bool,
}

/// Aggregate join outcome counts, reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub total: usize,
    pub exact_matches: usize,
    pub fallback_matches: usize,
    /// Fallback histograms discarded because the size correction produced a
    /// negative repeat count.
    pub negative_repeat_counts: usize,
    pub unannotated: usize,
}

/// Attaches allele-frequency annotations under a configured strategy.
#[derive(Debug)]
pub struct AnnotationJoiner {
    label: String,
    strategy: JoinStrategy,
}

impl AnnotationJoiner {
    #[must_use]
    pub fn new(label: &str, strategy: JoinStrategy) -> Self {
        Self {
            label: label.to_string(),
            strategy,
        }
    }

    /// Annotate every locus that has a match in the table; loci without one
    /// pass through untouched (a coverage gap, not a failure). Returns new
    /// loci, never mutating the input.
    ///
    /// # Errors
    ///
    /// `CatalogError::SchemaMismatch` if a compound locus reaches the join;
    /// frequency tables are keyed by simple locus boundaries.
    pub fn attach(
        &self,
        loci: &[Locus],
        table: &FrequencyTable,
    ) -> Result<(Vec<Locus>, JoinStats), CatalogError> {
        let mut stats = JoinStats::default();
        let mut annotated = Vec::with_capacity(loci.len());

        for locus in loci {
            if locus.compound_parts.is_some() {
                return Err(CatalogError::SchemaMismatch(format!(
                    "locus '{}' is a compound definition; split it before \
                     attaching allele frequencies",
                    locus.id
                )));
            }
            stats.total += 1;
            annotated.push(self.attach_one(locus, table, &mut stats));
        }

        info!(
            "Annotated {} of {} loci exactly and {} via overlap with {} \
             frequencies ({} unannotated, {} incompatible size corrections)",
            stats.exact_matches,
            stats.total,
            stats.fallback_matches,
            self.label,
            stats.unannotated,
            stats.negative_repeat_counts
        );
        Ok((annotated, stats))
    }

    fn attach_one(&self, locus: &Locus, table: &FrequencyTable, stats: &mut JoinStats) -> Locus {
        if let Some(entry) = table.exact_match(locus) {
            stats.exact_matches += 1;
            return self.annotate(locus, &entry.histogram);
        }

        if self.strategy.allow_overlap_fallback {
            if let Some(entry) = table.overlap_match(locus) {
                stats.fallback_matches += 1;
                let mut out = locus.with_annotation(
                    &format!("StdevFrom{}", self.label),
                    stdev_value(&entry.histogram),
                );
                if self.strategy.adjust_boundaries {
                    let motif_len = locus.motif.len() as i64;
                    let shift = (entry.len() as i64 - locus.len() as i64).div_euclid(motif_len);
                    match entry.histogram.adjust(shift) {
                        Some(adjusted) => {
                            out = out.with_annotation(
                                &format!("AlleleFrequenciesFrom{}", self.label),
                                adjusted.to_catalog_string().into(),
                            );
                        }
                        None => stats.negative_repeat_counts += 1,
                    }
                }
                return out;
            }
        }

        stats.unannotated += 1;
        locus.clone()
    }

    fn annotate(&self, locus: &Locus, histogram: &AlleleHistogram) -> Locus {
        locus
            .with_annotation(
                &format!("AlleleFrequenciesFrom{}", self.label),
                histogram.to_catalog_string().into(),
            )
            .with_annotation(&format!("StdevFrom{}", self.label), stdev_value(histogram))
    }
}

fn stdev_value(histogram: &AlleleHistogram) -> serde_json::Value {
    serde_json::Number::from_f64(histogram.stdev())
        .map_or(serde_json::Value::Null, serde_json::Value::Number)
}

fn parse_variant_id(variant_id: &str) -> Result<(String, u64, u64), CatalogError> {
    let malformed =
        || CatalogError::InvalidFormat(format!("malformed VariantId '{variant_id}'"));
    let fields: Vec<&str> = variant_id.split('_').collect();
    if fields.len() != 3 {
        return Err(malformed());
    }
    let start: u64 = fields[1].parse().map_err(|_| malformed())?;
    let end: u64 = fields[2].parse().map_err(|_| malformed())?;
    Ok((strip_chr(fields[0]).to_string(), start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locus(chrom: &str, start: u64, end: u64, motif: &str) -> Locus {
        Locus::new(chrom, start, end, motif, "test").unwrap()
    }

    fn histogram(pairs: &[(u32, u64)]) -> AlleleHistogram {
        AlleleHistogram::new(pairs.iter().copied().collect())
    }

    fn table_with(entries: &[(&str, u64, u64, Option<&str>, &[(u32, u64)])]) -> FrequencyTable {
        let mut table = FrequencyTable::default();
        for (chrom, start, end, motif, hist) in entries {
            table
                .insert(
                    chrom,
                    *start,
                    *end,
                    motif.map(|m| canonical_motif(m)),
                    histogram(hist),
                )
                .unwrap();
        }
        table
    }

    #[test]
    fn test_exact_match_round_trips_histogram() {
        let table = table_with(&[("1", 100, 110, None, &[(5, 10), (6, 2)])]);
        let joiner = AnnotationJoiner::new("Testset", JoinStrategy::default());

        let (annotated, stats) = joiner.attach(&[locus("1", 100, 110, "CAG")], &table).unwrap();
        assert_eq!(stats.exact_matches, 1);
        assert_eq!(
            annotated[0].annotations["AlleleFrequenciesFromTestset"],
            serde_json::json!("5x:10,6x:2")
        );
        assert!(annotated[0].annotations.contains_key("StdevFromTestset"));
    }

    #[test]
    fn test_no_match_passes_through_unannotated() {
        let table = table_with(&[("1", 100, 110, None, &[(5, 10)])]);
        let joiner = AnnotationJoiner::new("T", JoinStrategy::default());

        let (annotated, stats) = joiner.attach(&[locus("2", 100, 110, "CAG")], &table).unwrap();
        assert_eq!(stats.unannotated, 1);
        assert!(annotated[0].annotations.is_empty());
    }

    #[test]
    fn test_fallback_disabled_by_default() {
        let table = table_with(&[("1", 100, 114, Some("CAG"), &[(5, 10)])]);
        let joiner = AnnotationJoiner::new("T", JoinStrategy::default());

        let (_, stats) = joiner.attach(&[locus("1", 100, 112, "CAG")], &table).unwrap();
        assert_eq!(stats.fallback_matches, 0);
        assert_eq!(stats.unannotated, 1);
    }

    #[test]
    fn test_fallback_zero_shift_round_trips_histogram() {
        // same length, shifted by one base: boundary diff is zero repeat units
        let table = table_with(&[("1", 101, 113, Some("CAG"), &[(4, 7)])]);
        let joiner = AnnotationJoiner::new("T", JoinStrategy {
            allow_overlap_fallback: true,
            adjust_boundaries: true,
        });

        let (annotated, stats) = joiner.attach(&[locus("1", 100, 112, "CAG")], &table).unwrap();
        assert_eq!(stats.fallback_matches, 1);
        assert_eq!(
            annotated[0].annotations["AlleleFrequenciesFromT"],
            serde_json::json!("4x:7")
        );
    }

    #[test]
    fn test_fallback_adjusts_for_boundary_difference() {
        // locus [200,206) with AT vs entry [200,210): diff (10-6)/2 = 2,
        // so {5:10} becomes {3:10}
        let table = table_with(&[("1", 200, 210, Some("AT"), &[(5, 10)])]);
        let joiner = AnnotationJoiner::new("T", JoinStrategy {
            allow_overlap_fallback: true,
            adjust_boundaries: true,
        });

        let (annotated, stats) = joiner.attach(&[locus("1", 200, 206, "AT")], &table).unwrap();
        assert_eq!(stats.fallback_matches, 1);
        assert_eq!(
            annotated[0].annotations["AlleleFrequenciesFromT"],
            serde_json::json!("3x:10")
        );
    }

    #[test]
    fn test_fallback_discards_negative_repeat_counts_but_keeps_stdev() {
        // diff (30-6)/2 = 12 repeat units pushes {5:10} negative
        let table = table_with(&[("1", 200, 230, Some("AT"), &[(5, 10)])]);
        let joiner = AnnotationJoiner::new("T", JoinStrategy {
            allow_overlap_fallback: true,
            adjust_boundaries: true,
        });

        let (annotated, stats) = joiner.attach(&[locus("1", 200, 206, "AT")], &table).unwrap();
        assert_eq!(stats.negative_repeat_counts, 1);
        assert!(!annotated[0]
            .annotations
            .contains_key("AlleleFrequenciesFromT"));
        assert!(annotated[0].annotations.contains_key("StdevFromT"));
    }

    #[test]
    fn test_fallback_rejects_small_overlap_of_long_intervals() {
        // both intervals span >= 2 motif lengths but share only 2 bases,
        // less than 2 * motif_len = 6
        let table = table_with(&[("1", 108, 130, Some("CAG"), &[(5, 10)])]);
        let joiner = AnnotationJoiner::new("T", JoinStrategy {
            allow_overlap_fallback: true,
            adjust_boundaries: false,
        });

        let (_, stats) = joiner.attach(&[locus("1", 98, 110, "CAG")], &table).unwrap();
        assert_eq!(stats.fallback_matches, 0);
        assert_eq!(stats.unannotated, 1);
    }

    #[test]
    fn test_fallback_requires_matching_motif() {
        let table = table_with(&[("1", 100, 112, Some("AT"), &[(5, 10)])]);
        let joiner = AnnotationJoiner::new("T", JoinStrategy {
            allow_overlap_fallback: true,
            adjust_boundaries: false,
        });

        let (_, stats) = joiner.attach(&[locus("1", 100, 113, "CAG")], &table).unwrap();
        assert_eq!(stats.unannotated, 1);
    }

    #[test]
    fn test_compound_locus_is_rejected() {
        let mut compound = locus("1", 100, 130, "CAG");
        compound.compound_parts = Some(vec![locus("1", 100, 110, "CAG")]);
        let joiner = AnnotationJoiner::new("T", JoinStrategy::default());
        assert!(matches!(
            joiner.attach(&[compound], &FrequencyTable::default()).unwrap_err(),
            CatalogError::SchemaMismatch(_)
        ));
    }

    #[test]
    fn test_load_from_tsv() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freqs.tsv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "VariantId\tRepeatNumbers\tAlleleCounts\tCanonicalMotif").unwrap();
        writeln!(f, "chr1_100_110\t5,6\t10,2\tAGC").unwrap();
        writeln!(f, "chr2_40_60\t12\t7\t").unwrap();
        drop(f);

        let table = FrequencyTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        let found = table.exact_match(&locus("1", 100, 110, "CAG")).unwrap();
        assert_eq!(found.histogram.to_catalog_string(), "5x:10,6x:2");
        // the motif-less chr2 entry is exact-only
        assert!(table.overlap_match(&locus("2", 40, 60, "AT")).is_none());
    }
}
