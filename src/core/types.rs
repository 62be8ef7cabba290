use serde::{Deserialize, Serialize};

/// How one catalog's definition of a locus relates to the other catalog's
/// definition of the same locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapStatus {
    /// Intervals are identical.
    Yes,
    /// Equal length, different start offset.
    YesButShifted,
    /// This catalog's interval is a strict subset of the other catalog's.
    YesButNarrower,
    /// This catalog's interval strictly contains the other catalog's.
    YesButWider,
    /// No compatible definition in this catalog.
    #[serde(rename = "absent")]
    Absent,
}

impl OverlapStatus {
    /// True for any of the `Yes*` outcomes.
    #[must_use]
    pub fn is_present(self) -> bool {
        !matches!(self, Self::Absent)
    }
}

impl std::fmt::Display for OverlapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::YesButShifted => write!(f, "YesButShifted"),
            Self::YesButNarrower => write!(f, "YesButNarrower"),
            Self::YesButWider => write!(f, "YesButWider"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Policy applied when a candidate locus overlaps an already-accepted locus
/// with the same canonical motif.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Keep the definition from the higher-precedence catalog and record the
    /// candidate's source in the winner's `found_in` list. This preserves
    /// per-source boundaries, so locus identities stay stable across catalog
    /// versions.
    #[default]
    KeepFirst,
    /// Union touching/overlapping same-motif loci into a single wider locus.
    /// Only intended for early-stage catalog construction: merged boundaries
    /// shift as sources change, which breaks locus identity between versions.
    MergeAdjacentSameMotif,
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepFirst => write!(f, "keep-first"),
            Self::MergeAdjacentSameMotif => write!(f, "merge-adjacent-same-motif"),
        }
    }
}

/// Relation between two half-open intervals on the same chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalRelation {
    /// Same start and end.
    Identical,
    /// Same length, different start.
    Shifted,
    /// First interval is a strict subset of the second.
    FirstInsideSecond,
    /// Second interval is a strict subset of the first.
    SecondInsideFirst,
    /// Overlapping or disjoint, with neither containing the other.
    Neither,
}

/// Classify how interval `a` relates to interval `b` (both half-open).
#[must_use]
pub fn relate_intervals(a: (u64, u64), b: (u64, u64)) -> IntervalRelation {
    if a == b {
        IntervalRelation::Identical
    } else if a.1 - a.0 == b.1 - b.0 {
        IntervalRelation::Shifted
    } else if a.0 >= b.0 && a.1 <= b.1 {
        IntervalRelation::FirstInsideSecond
    } else if b.0 >= a.0 && b.1 <= a.1 {
        IntervalRelation::SecondInsideFirst
    } else {
        IntervalRelation::Neither
    }
}

/// Number of bases shared by two half-open intervals.
#[must_use]
pub fn overlap_size(a: (u64, u64), b: (u64, u64)) -> u64 {
    let start = a.0.max(b.0);
    let end = a.1.min(b.1);
    end.saturating_sub(start)
}
