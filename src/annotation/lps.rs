//! Longest-pure-segment (LPS) annotations.
//!
//! The LPS table reports, per locus and motif, how often that motif composed
//! the longest uninterrupted segment across long-read samples, and the
//! standard deviation of the segment length in bases. The attached stdev is
//! converted to repeat units.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::catalog::known::KnownLociLookup;
use crate::core::error::CatalogError;
use crate::core::locus::Locus;
use crate::parsing::table::Table;

/// Annotation values for one locus id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpsAnnotation {
    /// Stdev of the LPS length in repeat units, formatted to 3 decimals.
    pub length_stdev: String,
    /// `"{motif}: {n}/{total}"` share of alleles where this motif formed
    /// the LPS.
    pub motif_fraction: String,
}

/// LPS annotations keyed by locus id.
#[derive(Debug, Default)]
pub struct LpsTable {
    by_locus_id: HashMap<String, LpsAnnotation>,
    label: String,
}

impl LpsTable {
    /// Load an LPS quantile table. Requires columns `TRID`,
    /// `longestPureSegmentMotif`, `N_motif`, and `Stdev`; rows with empty
    /// values in any of them are filtered out and counted. `TRID` holds one
    /// or more comma-separated locus ids; known-pathogenic ids resolve
    /// through `known`, everything else must parse as
    /// `chrom-start0-end1-motif`.
    ///
    /// # Errors
    ///
    /// `CatalogError::InvalidFormat` for missing columns,
    /// `CatalogError::UnexpectedIdFormat` for unresolvable locus ids, and
    /// `CatalogError::SchemaMismatch` for non-numeric `N_motif`/`Stdev`
    /// values.
    pub fn load(path: &Path, known: &KnownLociLookup, label: &str) -> Result<Self, CatalogError> {
        let table = Table::read(path)?;
        table.require_columns(path, &["TRID", "longestPureSegmentMotif", "N_motif", "Stdev"])?;

        let mut filtered = 0usize;
        let mut rows: Vec<(&str, &str, f64, f64)> = Vec::with_capacity(table.len());
        for row in table.rows() {
            let trid = table.get(row, "TRID").unwrap_or_default();
            let motif = table.get(row, "longestPureSegmentMotif").unwrap_or_default();
            let n_motif = table.get(row, "N_motif").unwrap_or_default();
            let stdev = table.get(row, "Stdev").unwrap_or_default();
            if trid.is_empty() || motif.is_empty() || n_motif.is_empty() || stdev.is_empty() {
                filtered += 1;
                continue;
            }
            rows.push((
                trid,
                motif,
                parse_number(n_motif, "N_motif")?,
                parse_number(stdev, "Stdev")?,
            ));
        }
        if filtered > 0 {
            debug!("Filtered out {filtered} LPS records with missing values");
        }

        // N_motif sums across all rows sharing a TRID; each row then
        // contributes its motif's share of that total.
        let mut n_motif_by_trid: HashMap<&str, f64> = HashMap::new();
        for (trid, _, n_motif, _) in &rows {
            *n_motif_by_trid.entry(*trid).or_insert(0.0) += *n_motif;
        }

        let mut lps = Self {
            by_locus_id: HashMap::new(),
            label: label.to_string(),
        };
        for (trid, motif, n_motif, stdev) in &rows {
            let total = n_motif_by_trid[trid];
            let motif_fraction = format!("{motif}: {n_motif}/{total}");
            #[allow(clippy::cast_precision_loss)]
            let length_stdev = format!("{:.3}", stdev / motif.len() as f64);

            for locus_id in trid.split(',') {
                let resolved = known.resolve_or_parse(locus_id)?;
                if resolved.motif != *motif {
                    continue;
                }
                lps.by_locus_id.insert(
                    locus_id.to_string(),
                    LpsAnnotation {
                        length_stdev: length_stdev.clone(),
                        motif_fraction: motif_fraction.clone(),
                    },
                );
            }
        }

        info!(
            "Loaded LPS annotations for {} loci from {}",
            lps.by_locus_id.len(),
            path.display()
        );
        Ok(lps)
    }

    #[must_use]
    pub fn get(&self, locus_id: &str) -> Option<&LpsAnnotation> {
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

    /// Attach LPS fields by exact locus id; unmatched loci pass through.
    /// Returns new loci and the number annotated.
    #[must_use]
    pub fn annotate(&self, loci: &[Locus]) -> (Vec<Locus>, usize) {
        let mut annotated = 0usize;
        let out = loci
            .iter()
            .map(|locus| match self.by_locus_id.get(&locus.id) {
                Some(annotation) => {
                    annotated += 1;
                    locus
                        .with_annotation(
                            &format!("LPSLengthStdevFrom{}", self.label),
                            annotation.length_stdev.clone().into(),
                        )
                        .with_annotation(
                            &format!("LPSMotifFractionFrom{}", self.label),
                            annotation.motif_fraction.clone().into(),
                        )
                }
                None => locus.clone(),
            })
            .collect();
        info!("Annotated {annotated} out of {} loci with LPS fields", loci.len());
        (out, annotated)
    }
}

fn parse_number(value: &str, column: &str) -> Result<f64, CatalogError> {
    value.parse().map_err(|_| {
        CatalogError::SchemaMismatch(format!("invalid {column} value '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_lps(rows: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lps.tsv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "TRID\tlongestPureSegmentMotif\tN_motif\tStdev").unwrap();
        for row in rows {
            writeln!(f, "{row}").unwrap();
        }
        drop(f);
        (dir, path)
    }

    #[test]
    fn test_load_converts_stdev_to_repeat_units() {
        let (_dir, path) = write_lps(&["1-100-110-CAG\tCAG\t40\t7.5"]);
        let lps = LpsTable::load(&path, &KnownLociLookup::default(), "HPRC100").unwrap();

        let annotation = lps.get("1-100-110-CAG").unwrap();
        assert_eq!(annotation.length_stdev, "2.500");
        assert_eq!(annotation.motif_fraction, "CAG: 40/40");
    }

    #[test]
    fn test_load_sums_n_motif_across_shared_trid() {
        let (_dir, path) = write_lps(&[
            "1-100-110-CAG\tCAG\t30\t6.0",
            "1-100-110-CAG\tCAGCAG\t10\t6.0",
        ]);
        let lps = LpsTable::load(&path, &KnownLociLookup::default(), "HPRC100").unwrap();

        // only the row whose motif matches the locus id's motif is attached
        let annotation = lps.get("1-100-110-CAG").unwrap();
        assert_eq!(annotation.motif_fraction, "CAG: 30/40");
    }

    #[test]
    fn test_load_resolves_known_pathogenic_ids() {
        let mut known = KnownLociLookup::default();
        known.insert("HTT", "4", 3_074_876, 3_074_933, "CAG");
        let (_dir, path) = write_lps(&["HTT\tCAG\t20\t3.0"]);

        let lps = LpsTable::load(&path, &known, "HPRC100").unwrap();
        assert_eq!(lps.get("HTT").unwrap().length_stdev, "1.000");
    }

    #[test]
    fn test_load_rejects_unknown_id_form() {
        let (_dir, path) = write_lps(&["NOT_A_LOCUS\tCAG\t20\t3.0"]);
        assert!(matches!(
            LpsTable::load(&path, &KnownLociLookup::default(), "X").unwrap_err(),
            CatalogError::UnexpectedIdFormat(_)
        ));
    }

    #[test]
    fn test_load_filters_rows_with_missing_values() {
        let (_dir, path) = write_lps(&["1-100-110-CAG\tCAG\t40\t", "1-200-230-AT\tAT\t8\t2.0"]);
        let lps = LpsTable::load(&path, &KnownLociLookup::default(), "X").unwrap();
        assert!(lps.get("1-100-110-CAG").is_none());
        assert!(lps.get("1-200-230-AT").is_some());
    }

    #[test]
    fn test_annotate_by_exact_id() {
        let (_dir, path) = write_lps(&["1-100-110-CAG\tCAG\t40\t7.5"]);
        let lps = LpsTable::load(&path, &KnownLociLookup::default(), "HPRC100").unwrap();

        let loci = vec![
            Locus::new("1", 100, 110, "CAG", "a").unwrap(),
            Locus::new("2", 5, 25, "AT", "a").unwrap(),
        ];
        let (annotated, count) = lps.annotate(&loci);
        assert_eq!(count, 1);
        assert_eq!(
            annotated[0].annotations["LPSLengthStdevFromHPRC100"],
            serde_json::json!("2.500")
        );
        assert!(annotated[1].annotations.is_empty());
    }
}
