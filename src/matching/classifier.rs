//! Pairwise locus correspondence between two catalogs.

use serde::Serialize;
use tracing::debug;

use crate::catalog::merger::CatalogMerger;
use crate::catalog::store::LocusCatalog;
use crate::core::error::CatalogError;
use crate::core::locus::Locus;
use crate::core::types::{relate_intervals, IntervalRelation, OverlapPolicy, OverlapStatus};

/// Default minimum overlap, as a fraction of the smaller interval, for two
/// differently-keyed loci to count as the same repeat.
pub const DEFAULT_OVERLAP_FRACTION: f64 = 0.05;

/// One locus of the pairwise union, with a status per catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapRecord {
    pub locus_id: String,
    pub left: OverlapStatus,
    pub right: OverlapStatus,
}

/// Classifies each locus of two catalogs' union into categorical outcomes.
#[derive(Debug, Clone)]
pub struct OverlapClassifier {
    overlap_fraction: f64,
}

impl Default for OverlapClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP_FRACTION)
    }
}

impl OverlapClassifier {
    #[must_use]
    pub fn new(overlap_fraction: f64) -> Self {
        Self { overlap_fraction }
    }

    /// Classify every locus in the union of the two catalogs.
    ///
    /// The union is formed by a keep-first merge with the left catalog taking
    /// precedence, so each repeat appears exactly once. For each union locus,
    /// each side's candidate is its exact-id match, falling back to the
    /// best same-chromosome, same-canonical-motif overlap at or above the
    /// configured fraction of the smaller interval.
    ///
    /// # Errors
    ///
    /// `CatalogError::AssertionViolation` when a record breaks the
    /// symmetry or coverage invariants; that indicates a merge or
    /// classification bug, never bad input data.
    pub fn classify_pair(
        &self,
        left_name: &str,
        left: &[Locus],
        right_name: &str,
        right: &[Locus],
    ) -> Result<Vec<OverlapRecord>, CatalogError> {
        let union = CatalogMerger::new(OverlapPolicy::KeepFirst).merge(&[
            (left_name.to_string(), left.to_vec()),
            (right_name.to_string(), right.to_vec()),
        ])?;
        let left = LocusCatalog::new(left_name, left.to_vec())?;
        let right = LocusCatalog::new(right_name, right.to_vec())?;

        let mut records = Vec::with_capacity(union.loci.len());
        for locus in &union.loci {
            let record = self.classify_locus(locus, left_name, &left, &right)?;
            check_invariants(&record)?;
            records.push(record);
        }

        debug!(
            "Classified {} union loci between {} and {}",
            records.len(),
            left.name,
            right.name
        );
        Ok(records)
    }

    fn classify_locus(
        &self,
        locus: &Locus,
        left_name: &str,
        left: &LocusCatalog,
        right: &LocusCatalog,
    ) -> Result<OverlapRecord, CatalogError> {
        let candidate_left = left.find_candidate(locus, self.overlap_fraction);
        let candidate_right = right.find_candidate(locus, self.overlap_fraction);

        let (left_status, right_status) = match (candidate_left, candidate_right) {
            (Some(a), Some(b)) => match relate_intervals(a.interval(), b.interval()) {
                IntervalRelation::Identical => (OverlapStatus::Yes, OverlapStatus::Yes),
                IntervalRelation::Shifted => {
                    (OverlapStatus::YesButShifted, OverlapStatus::YesButShifted)
                }
                IntervalRelation::FirstInsideSecond => {
                    (OverlapStatus::YesButNarrower, OverlapStatus::YesButWider)
                }
                IntervalRelation::SecondInsideFirst => {
                    (OverlapStatus::YesButWider, OverlapStatus::YesButNarrower)
                }
                // Overlapping, but neither contains the other: not a match.
                // The union locus stays a Yes on its own side only.
                IntervalRelation::Neither => {
                    if locus.source == left_name {
                        require_exact(locus, a)?;
                        (OverlapStatus::Yes, OverlapStatus::Absent)
                    } else {
                        require_exact(locus, b)?;
                        (OverlapStatus::Absent, OverlapStatus::Yes)
                    }
                }
            },
            (Some(a), None) => {
                require_exact(locus, a)?;
                (OverlapStatus::Yes, OverlapStatus::Absent)
            }
            (None, Some(b)) => {
                require_exact(locus, b)?;
                (OverlapStatus::Absent, OverlapStatus::Yes)
            }
            (None, None) => {
                return Err(CatalogError::AssertionViolation(format!(
                    "locus '{}' is in the merged union but matches neither catalog",
                    locus.id
                )))
            }
        };

        Ok(OverlapRecord {
            locus_id: locus.id.clone(),
            left: left_status,
            right: right_status,
        })
    }
}

/// A locus reported absent on one side must be an exact match on its own
/// side; anything else means the union or candidate search is broken.
fn require_exact(locus: &Locus, own: &Locus) -> Result<(), CatalogError> {
    if own.interval() == locus.interval() {
        Ok(())
    } else {
        Err(CatalogError::AssertionViolation(format!(
            "locus '{}' is absent from the other catalog but not an exact \
             match of its own catalog's definition '{}'",
            locus.id, own.id
        )))
    }
}

fn check_invariants(record: &OverlapRecord) -> Result<(), CatalogError> {
    let ok = match (record.left, record.right) {
        (OverlapStatus::Absent, OverlapStatus::Absent) => false,
        (OverlapStatus::Absent, other) | (other, OverlapStatus::Absent) => {
            other == OverlapStatus::Yes
        }
        (OverlapStatus::YesButWider, other) => other == OverlapStatus::YesButNarrower,
        (OverlapStatus::YesButNarrower, other) => other == OverlapStatus::YesButWider,
        (left, right) => left == right,
    };
    if ok {
        Ok(())
    } else {
        Err(CatalogError::AssertionViolation(format!(
            "asymmetric classification for locus '{}': {} vs {}",
            record.locus_id, record.left, record.right
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locus(chrom: &str, start: u64, end: u64, motif: &str) -> Locus {
        Locus::new(chrom, start, end, motif, "unset").unwrap()
    }

    fn classify(
        left: Vec<Locus>,
        right: Vec<Locus>,
        overlap_fraction: f64,
    ) -> Vec<OverlapRecord> {
        OverlapClassifier::new(overlap_fraction)
            .classify_pair("left", &left, "right", &right)
            .unwrap()
    }

    #[test]
    fn test_identical_loci_are_yes_on_both_sides() {
        let records = classify(
            vec![locus("1", 100, 110, "CAG")],
            vec![locus("1", 100, 110, "CAG")],
            0.05,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].left, OverlapStatus::Yes);
        assert_eq!(records[0].right, OverlapStatus::Yes);
    }

    #[test]
    fn test_unique_locus_is_absent_on_the_other_side() {
        let records = classify(vec![locus("1", 100, 110, "CAG")], vec![], 0.05);
        assert_eq!(records[0].left, OverlapStatus::Yes);
        assert_eq!(records[0].right, OverlapStatus::Absent);

        let records = classify(vec![], vec![locus("1", 100, 110, "CAG")], 0.05);
        assert_eq!(records[0].left, OverlapStatus::Absent);
        assert_eq!(records[0].right, OverlapStatus::Yes);
    }

    #[test]
    fn test_shifted_equal_length_intervals() {
        let records = classify(
            vec![locus("1", 100, 110, "CAG")],
            vec![locus("1", 103, 113, "CAG")],
            0.05,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].left, OverlapStatus::YesButShifted);
        assert_eq!(records[0].right, OverlapStatus::YesButShifted);
    }

    #[test]
    fn test_narrower_and_wider_are_symmetric() {
        let records = classify(
            vec![locus("1", 102, 108, "AT")],
            vec![locus("1", 100, 110, "AT")],
            0.05,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].left, OverlapStatus::YesButNarrower);
        assert_eq!(records[0].right, OverlapStatus::YesButWider);

        let flipped = classify(
            vec![locus("1", 100, 110, "AT")],
            vec![locus("1", 102, 108, "AT")],
            0.05,
        );
        assert_eq!(flipped[0].left, OverlapStatus::YesButWider);
        assert_eq!(flipped[0].right, OverlapStatus::YesButNarrower);
    }

    #[test]
    fn test_partial_overlap_neither_containing_is_absent() {
        // A = [100,110) and C = [105,120): same motif, overlapping, but
        // neither contains the other, so there is no cross-match.
        let records = classify(
            vec![locus("1", 100, 110, "CAG")],
            vec![locus("1", 105, 120, "CAG")],
            0.05,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].locus_id, "1-100-110-CAG");
        assert_eq!(records[0].left, OverlapStatus::Yes);
        assert_eq!(records[0].right, OverlapStatus::Absent);
    }

    #[test]
    fn test_different_motifs_give_two_records() {
        let records = classify(
            vec![locus("1", 100, 110, "CAG")],
            vec![locus("1", 100, 110, "AT")],
            0.05,
        );
        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.left == OverlapStatus::Absent || record.right == OverlapStatus::Absent);
        }
    }

    #[test]
    fn test_overlap_fraction_monotonicity() {
        // Tightening the threshold may demote weak overlap matches to
        // absent, but never touches exact-id matches.
        let left = vec![locus("1", 100, 110, "CAG"), locus("2", 50, 80, "AT")];
        let right = vec![locus("1", 103, 113, "CAG"), locus("2", 50, 80, "AT")];

        let loose = classify(left.clone(), right.clone(), 0.05);
        let shifted = loose.iter().find(|r| r.locus_id == "1-100-110-CAG").unwrap();
        assert_eq!(shifted.right, OverlapStatus::YesButShifted);

        // [100,110) and [103,113) share 7 of 10 bases, below a 0.9 cutoff
        let tight = classify(left, right, 0.9);
        for (weak, strict) in loose.iter().zip(&tight) {
            assert_eq!(weak.locus_id, strict.locus_id);
            // a match can only disappear, never appear, as the threshold rises
            if !weak.right.is_present() {
                assert!(!strict.right.is_present());
            }
        }
        let demoted = tight.iter().find(|r| r.locus_id == "1-100-110-CAG").unwrap();
        assert_eq!(demoted.right, OverlapStatus::Absent);

        // the exact-id match on chr2 survives any threshold
        let strict_exact = tight.iter().find(|r| r.locus_id == "2-50-80-AT").unwrap();
        assert_eq!(strict_exact.left, OverlapStatus::Yes);
        assert_eq!(strict_exact.right, OverlapStatus::Yes);
    }

    #[test]
    fn test_symmetry_invariant_holds_across_mixed_catalogs() {
        let left = vec![
            locus("1", 100, 110, "CAG"),
            locus("1", 500, 530, "AT"),
            locus("2", 10, 40, "AAAG"),
        ];
        let right = vec![
            locus("1", 95, 125, "CAG"),
            locus("1", 500, 530, "AT"),
            locus("3", 7, 19, "CTT"),
        ];
        let records = classify(left, right, 0.05);
        for record in &records {
            assert_eq!(
                record.left == OverlapStatus::YesButWider,
                record.right == OverlapStatus::YesButNarrower
            );
            assert_eq!(
                record.left == OverlapStatus::YesButNarrower,
                record.right == OverlapStatus::YesButWider
            );
            assert!(record.left.is_present() || record.right.is_present());
        }
    }
}
