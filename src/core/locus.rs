use std::collections::BTreeMap;

use crate::core::error::CatalogError;
use crate::utils::motif::{canonical_motif, is_acgtn, strip_chr, with_chr};

/// A single tandem repeat locus: a half-open interval on the reference genome
/// plus the repeat unit that defines it.
///
/// Loci are created once per source catalog load and never mutated after
/// merging; annotation steps clone and extend them instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Locus {
    /// Stable identifier: `chrom-start0-end1-motif` for ordinary loci, or the
    /// externally supplied id for known disease-associated loci.
    pub id: String,

    /// Contig name with any `chr` prefix stripped.
    pub chrom: String,

    /// 0-based inclusive start.
    pub start: u64,

    /// 0-based exclusive end. Always greater than `start`.
    pub end: u64,

    /// Primary repeat unit, upper-cased.
    pub motif: String,

    /// Lexicographically minimal rotation of the motif or its reverse
    /// complement; used for all motif-compatibility checks.
    pub canonical_motif: String,

    /// The locus structure expression, e.g. `(CAG)*`.
    pub structure: String,

    /// Variant type carried through from the source catalog.
    pub variant_type: String,

    /// Name of the catalog this definition came from.
    pub source: String,

    /// All catalogs containing a compatible definition, in precedence order.
    /// Populated by the merger; starts as `[source]`.
    pub found_in: Vec<String>,

    /// Sub-loci when this record describes several adjacent repeats sharing
    /// one outer definition. `None` for simple loci; never `Some(vec![])`.
    pub compound_parts: Option<Vec<Locus>>,

    /// Set when the motif contains letters outside {A,C,G,T,N}. Flagged
    /// loci are kept; discarding them is a filtering decision made by the
    /// caller.
    pub non_acgtn_motif: bool,

    /// Extra fields attached by annotation steps, flattened into the output
    /// record.
    pub annotations: BTreeMap<String, serde_json::Value>,
}

#[allow(clippy::len_without_is_empty)] // end > start is a construction invariant
impl Locus {
    /// Create a simple locus, deriving its id from the coordinates and motif.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInterval` if `end <= start`.
    pub fn new(
        chrom: &str,
        start: u64,
        end: u64,
        motif: &str,
        source: &str,
    ) -> Result<Self, CatalogError> {
        let motif = motif.to_uppercase();
        let structure = format!("({motif})*");
        Self::with_details(chrom, start, end, &motif, &structure, "Repeat", source, None)
    }

    /// Create a locus with an explicit structure, variant type, and
    /// (optionally) an externally supplied id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInterval` if `end <= start`.
    #[allow(clippy::too_many_arguments)]
    pub fn with_details(
        chrom: &str,
        start: u64,
        end: u64,
        motif: &str,
        structure: &str,
        variant_type: &str,
        source: &str,
        external_id: Option<&str>,
    ) -> Result<Self, CatalogError> {
        let chrom = strip_chr(chrom).to_string();
        if end <= start {
            return Err(CatalogError::InvalidInterval { chrom, start, end });
        }

        let motif = motif.to_uppercase();
        let id = match external_id {
            Some(id) => id.to_string(),
            None => derive_locus_id(&chrom, start, end, &motif),
        };
        let non_acgtn_motif = !is_acgtn(&motif);

        Ok(Self {
            id,
            canonical_motif: canonical_motif(&motif),
            chrom,
            start,
            end,
            motif,
            structure: structure.to_string(),
            variant_type: variant_type.to_string(),
            source: source.to_string(),
            found_in: vec![source.to_string()],
            compound_parts: None,
            non_acgtn_motif,
            annotations: BTreeMap::new(),
        })
    }

    /// Interval length in bases. Never zero: `end > start` is a construction
    /// invariant.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// The half-open interval as a pair.
    #[must_use]
    pub fn interval(&self) -> (u64, u64) {
        (self.start, self.end)
    }

    /// `ReferenceRegion` string with the `chr` prefix restored.
    #[must_use]
    pub fn region(&self) -> String {
        format!("{}:{}-{}", with_chr(&self.chrom), self.start, self.end)
    }

    /// Return the standalone sub-loci of a compound record, or a clone of the
    /// locus itself when it is simple.
    #[must_use]
    pub fn split_compound(&self) -> Vec<Locus> {
        match &self.compound_parts {
            Some(parts) => parts.clone(),
            None => vec![self.clone()],
        }
    }

    /// Clone the locus with one extra annotation field.
    #[must_use]
    pub fn with_annotation(&self, key: &str, value: serde_json::Value) -> Locus {
        let mut out = self.clone();
        out.annotations.insert(key.to_string(), value);
        out
    }
}

/// Derive the canonical id for a simple locus.
#[must_use]
pub fn derive_locus_id(chrom: &str, start: u64, end: u64, motif: &str) -> String {
    format!("{}-{start}-{end}-{motif}", strip_chr(chrom))
}

/// Parse a `chrom-start0-end1-motif` id back into its fields.
///
/// # Errors
///
/// Returns `CatalogError::UnexpectedIdFormat` unless the id has exactly four
/// dash-separated fields with numeric coordinates.
pub fn parse_locus_id(id: &str) -> Result<(String, u64, u64, String), CatalogError> {
    let fields: Vec<&str> = id.split('-').collect();
    if fields.len() != 4 {
        return Err(CatalogError::UnexpectedIdFormat(id.to_string()));
    }
    let start: u64 = fields[1]
        .parse()
        .map_err(|_| CatalogError::UnexpectedIdFormat(id.to_string()))?;
    let end: u64 = fields[2]
        .parse()
        .map_err(|_| CatalogError::UnexpectedIdFormat(id.to_string()))?;
    Ok((
        strip_chr(fields[0]).to_string(),
        start,
        end,
        fields[3].to_string(),
    ))
}

/// Parse a `chrom:start-end` region string into chr-stripped fields.
///
/// # Errors
///
/// Returns `CatalogError::InvalidFormat` for malformed strings and
/// `CatalogError::InvalidInterval` for degenerate coordinates.
pub fn parse_region(region: &str) -> Result<(String, u64, u64), CatalogError> {
    let malformed = || CatalogError::InvalidFormat(format!("malformed region '{region}'"));

    let (chrom, range) = region.rsplit_once(':').ok_or_else(malformed)?;
    let (start, end) = range.split_once('-').ok_or_else(malformed)?;
    let start: u64 = start.parse().map_err(|_| malformed())?;
    let end: u64 = end.parse().map_err(|_| malformed())?;

    let chrom = strip_chr(chrom).to_string();
    if end <= start {
        return Err(CatalogError::InvalidInterval { chrom, start, end });
    }
    Ok((chrom, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_id_without_chr_prefix() {
        let locus = Locus::new("chr1", 100, 110, "CAG", "catalogA").unwrap();
        assert_eq!(locus.id, "1-100-110-CAG");
        assert_eq!(locus.chrom, "1");
        assert_eq!(locus.region(), "chr1:100-110");
        assert_eq!(locus.found_in, vec!["catalogA"]);
    }

    #[test]
    fn test_new_rejects_degenerate_interval() {
        let err = Locus::new("chr1", 110, 110, "CAG", "a").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInterval { .. }));
        assert!(Locus::new("chr1", 110, 100, "CAG", "a").is_err());
    }

    #[test]
    fn test_external_id_is_preserved() {
        let locus = Locus::with_details(
            "chr4",
            3_074_876,
            3_074_933,
            "CAG",
            "(CAG)*",
            "Repeat",
            "KnownDiseaseAssociatedLoci",
            Some("HTT"),
        )
        .unwrap();
        assert_eq!(locus.id, "HTT");
    }

    #[test]
    fn test_non_acgtn_motif_is_flagged_not_dropped() {
        let locus = Locus::new("chr13", 100, 125, "AARRG", "x").unwrap();
        assert!(locus.non_acgtn_motif);
        assert_eq!(locus.motif, "AARRG");
    }

    #[test]
    fn test_motif_uppercased_and_canonicalized() {
        let locus = Locus::new("1", 10, 22, "cag", "x").unwrap();
        assert_eq!(locus.motif, "CAG");
        assert_eq!(locus.canonical_motif, "AGC");
    }

    #[test]
    fn test_parse_locus_id_round_trip() {
        let (chrom, start, end, motif) = parse_locus_id("1-100-110-CAG").unwrap();
        assert_eq!((chrom.as_str(), start, end, motif.as_str()), ("1", 100, 110, "CAG"));
        assert_eq!(derive_locus_id(&chrom, start, end, &motif), "1-100-110-CAG");
    }

    #[test]
    fn test_parse_locus_id_rejects_other_forms() {
        assert!(matches!(
            parse_locus_id("HTT").unwrap_err(),
            CatalogError::UnexpectedIdFormat(_)
        ));
        assert!(parse_locus_id("1-abc-110-CAG").is_err());
        assert!(parse_locus_id("1-100-110-CAG-extra").is_err());
    }

    #[test]
    fn test_parse_region() {
        assert_eq!(
            parse_region("chr1:100-110").unwrap(),
            ("1".to_string(), 100, 110)
        );
        assert!(matches!(
            parse_region("chr1:110-100").unwrap_err(),
            CatalogError::InvalidInterval { .. }
        ));
        assert!(parse_region("chr1").is_err());
    }

    #[test]
    fn test_split_compound_of_simple_locus() {
        let locus = Locus::new("1", 100, 110, "CAG", "x").unwrap();
        assert_eq!(locus.split_compound(), vec![locus.clone()]);
    }
}
