//! Motif helpers: canonicalization, structure parsing, and alphabet checks.

use crate::core::error::CatalogError;

/// Check whether a motif uses only the supported DNA alphabet (plus N).
///
/// # Examples
///
/// ```
/// use tr_catalog::utils::motif::is_acgtn;
///
/// assert!(is_acgtn("CAG"));
/// assert!(is_acgtn("AAN"));
/// assert!(!is_acgtn("AARRG")); // IUPAC ambiguity codes are not supported
/// ```
#[must_use]
pub fn is_acgtn(motif: &str) -> bool {
    !motif.is_empty() && motif.chars().all(|c| matches!(c, 'A' | 'C' | 'G' | 'T' | 'N'))
}

/// Reverse complement of a motif. Characters outside ACGT map to themselves
/// (N stays N; flagged ambiguity codes pass through unchanged).
#[must_use]
pub fn reverse_complement(motif: &str) -> String {
    motif
        .chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'C' => 'G',
            'G' => 'C',
            'T' => 'A',
            other => other,
        })
        .collect()
}

/// Compute the canonical form of a motif: the lexicographically smallest
/// rotation of the motif or of its reverse complement.
///
/// Motif-compatibility checks during merging, classification, and annotation
/// fallback all compare canonical motifs, so that `AGC`, `GCA`, and `GCT`
/// are treated as the same repeat unit.
#[must_use]
pub fn canonical_motif(motif: &str) -> String {
    let upper = motif.to_uppercase();
    if upper.is_empty() {
        return upper;
    }

    let mut best: Option<String> = None;
    for candidate in [upper.clone(), reverse_complement(&upper)] {
        for i in 0..candidate.len() {
            let rotation = format!("{}{}", &candidate[i..], &candidate[..i]);
            if best.as_ref().map_or(true, |b| rotation < *b) {
                best = Some(rotation);
            }
        }
    }
    best.unwrap_or(upper)
}

/// Extract the repeat motifs from a locus structure expression by taking the
/// parenthesized groups in order and upper-casing them. Repetition operators
/// (`*`, `+`) and interruption sequences between groups are dropped.
///
/// `"(CAG)*CAACAG(CCG)+"` yields `["CAG", "CCG"]`.
///
/// # Errors
///
/// Returns `CatalogError::InvalidFormat` for unbalanced parentheses, empty
/// groups, or structures with no group at all.
pub fn parse_motifs_from_structure(structure: &str) -> Result<Vec<String>, CatalogError> {
    let mut motifs = Vec::new();
    let mut current: Option<String> = None;

    for c in structure.chars() {
        match c {
            '(' => {
                if current.is_some() {
                    return Err(CatalogError::InvalidFormat(format!(
                        "nested parentheses in locus structure '{structure}'"
                    )));
                }
                current = Some(String::new());
            }
            ')' => match current.take() {
                Some(motif) if !motif.is_empty() => motifs.push(motif.to_uppercase()),
                _ => {
                    return Err(CatalogError::InvalidFormat(format!(
                        "empty or unbalanced group in locus structure '{structure}'"
                    )))
                }
            },
            other => {
                if let Some(motif) = current.as_mut() {
                    motif.push(other);
                }
            }
        }
    }

    if current.is_some() {
        return Err(CatalogError::InvalidFormat(format!(
            "unterminated group in locus structure '{structure}'"
        )));
    }
    if motifs.is_empty() {
        return Err(CatalogError::InvalidFormat(format!(
            "no repeat unit found in locus structure '{structure}'"
        )));
    }
    Ok(motifs)
}

/// Strip a leading `chr` prefix for internal keying.
#[must_use]
pub fn strip_chr(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

/// Restore the `chr` prefix for output.
#[must_use]
pub fn with_chr(chrom: &str) -> String {
    if chrom.starts_with("chr") {
        chrom.to_string()
    } else {
        format!("chr{chrom}")
    }
}
