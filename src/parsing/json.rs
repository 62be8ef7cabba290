//! ExpansionHunter-style JSON catalogs.
//!
//! A catalog is a JSON array of records with `LocusId`, `ReferenceRegion`,
//! `LocusStructure`, `VariantType`, and optionally `VariantId` fields.
//! `ReferenceRegion`/`VariantId`/`VariantType` may be list-valued when one
//! record defines several adjacent repeats (a compound locus).
//!
//! Multi-million-locus catalogs are read element-by-element through a serde
//! sequence visitor so memory stays bounded; writing streams records the same
//! way.

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use serde::de::{DeserializeSeed, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::catalog::known::KnownLociLookup;
use crate::core::error::CatalogError;
use crate::core::locus::{parse_region, Locus};
use crate::parsing::{create_writer, open_reader};
use crate::utils::motif::parse_motifs_from_structure;

/// A field that is either a single value or a positional list (compound
/// definitions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// The values as a list, regardless of shape.
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v.clone()],
            Self::Many(vs) => vs.clone(),
        }
    }

    #[must_use]
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

/// One record of an ExpansionHunter-style catalog, as serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "LocusId")]
    pub locus_id: String,

    #[serde(rename = "ReferenceRegion")]
    pub reference_region: OneOrMany<String>,

    #[serde(rename = "LocusStructure")]
    pub locus_structure: String,

    #[serde(rename = "VariantType", default, skip_serializing_if = "Option::is_none")]
    pub variant_type: Option<OneOrMany<String>>,

    #[serde(rename = "VariantId", default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<OneOrMany<String>>,

    #[serde(rename = "Source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(rename = "FoundIn", default, skip_serializing_if = "Option::is_none")]
    pub found_in: Option<Vec<String>>,

    /// Annotation fields carried alongside the core definition.
    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, serde_json::Value>,
}

/// How to represent compound records when normalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundHandling {
    /// Emit each sub-locus as a standalone locus (the shape the merger
    /// consumes; matches the pipeline's split-adjacent-loci preprocessing).
    Split,
    /// Emit one locus spanning the whole record, with `compound_parts` set.
    Keep,
}

/// Convert one catalog record into canonical loci.
///
/// Ids of loci present in `known` keep their external identifier; all other
/// ids are derived from coordinates and motif.
///
/// # Errors
///
/// `CatalogError::SchemaMismatch` when compound list fields disagree in
/// length, `CatalogError::InvalidInterval` for degenerate regions, and
/// `CatalogError::InvalidFormat` for malformed structures or regions.
pub fn normalize_record(
    record: &CatalogRecord,
    known: &KnownLociLookup,
    source: &str,
    compound: CompoundHandling,
) -> Result<Vec<Locus>, CatalogError> {
    let motifs = parse_motifs_from_structure(&record.locus_structure)?;
    let regions = record.reference_region.to_vec();
    let variant_types = match &record.variant_type {
        Some(vt) => vt.to_vec(),
        None => vec!["Repeat".to_string(); regions.len()],
    };

    if !record.reference_region.is_many() {
        let (chrom, start, end) = parse_region(&regions[0])?;
        let external_id = known.contains(&record.locus_id).then_some(record.locus_id.as_str());
        let variant_type = variant_types.first().map_or("Repeat", String::as_str);
        let locus = Locus::with_details(
            &chrom,
            start,
            end,
            &motifs[0],
            &record.locus_structure,
            variant_type,
            source,
            external_id,
        )?;
        return Ok(vec![locus]);
    }

    // Compound definition: zip VariantId, ReferenceRegion, and the motifs
    // parsed from the structure positionally. Lengths must agree exactly.
    let variant_ids = record
        .variant_id
        .as_ref()
        .map(OneOrMany::to_vec)
        .ok_or_else(|| {
            CatalogError::SchemaMismatch(format!(
                "locus '{}' has a list-valued ReferenceRegion but no VariantId",
                record.locus_id
            ))
        })?;
    if variant_ids.len() != regions.len() || motifs.len() != regions.len() {
        return Err(CatalogError::SchemaMismatch(format!(
            "locus '{}': {} regions, {} variant ids, {} motifs",
            record.locus_id,
            regions.len(),
            variant_ids.len(),
            motifs.len()
        )));
    }

    let mut parts = Vec::with_capacity(regions.len());
    for (i, (region, variant_id)) in regions.iter().zip(&variant_ids).enumerate() {
        let (chrom, start, end) = parse_region(region)?;
        let external_id = known.contains(variant_id).then_some(variant_id.as_str());
        let variant_type = variant_types
            .get(i)
            .or_else(|| variant_types.first())
            .map_or("Repeat", String::as_str);
        parts.push(Locus::with_details(
            &chrom,
            start,
            end,
            &motifs[i],
            &format!("({})*", motifs[i]),
            variant_type,
            source,
            external_id,
        )?);
    }

    match compound {
        CompoundHandling::Split => Ok(parts),
        CompoundHandling::Keep => {
            let chrom = parts[0].chrom.clone();
            let start = parts.iter().map(|p| p.start).min().unwrap_or(0);
            let end = parts.iter().map(|p| p.end).max().unwrap_or(0);
            let mut outer = Locus::with_details(
                &chrom,
                start,
                end,
                &motifs[0],
                &record.locus_structure,
                "Repeat",
                source,
                Some(&record.locus_id),
            )?;
            outer.compound_parts = Some(parts);
            Ok(vec![outer])
        }
    }
}

/// Serialize a locus back into the ExpansionHunter record shape.
#[must_use]
pub fn record_from_locus(locus: &Locus) -> CatalogRecord {
    let (reference_region, variant_id, variant_type) = match &locus.compound_parts {
        Some(parts) => (
            OneOrMany::Many(parts.iter().map(Locus::region).collect()),
            Some(OneOrMany::Many(parts.iter().map(|p| p.id.clone()).collect())),
            Some(OneOrMany::Many(
                parts.iter().map(|p| p.variant_type.clone()).collect(),
            )),
        ),
        None => (
            OneOrMany::One(locus.region()),
            None,
            Some(OneOrMany::One(locus.variant_type.clone())),
        ),
    };

    CatalogRecord {
        locus_id: locus.id.clone(),
        reference_region,
        locus_structure: locus.structure.clone(),
        variant_type,
        variant_id,
        source: Some(locus.source.clone()),
        found_in: Some(locus.found_in.clone()),
        extra: locus.annotations.clone(),
    }
}

/// Stream a JSON array of catalog records, invoking `callback` per record.
///
/// # Errors
///
/// Propagates IO/JSON errors and the first error returned by the callback;
/// per-record errors abort the whole load so no partial catalog is emitted.
pub fn for_each_record<R, F>(reader: R, callback: F) -> Result<(), CatalogError>
where
    R: Read,
    F: FnMut(CatalogRecord) -> Result<(), CatalogError>,
{
    struct RecordSeq<'a, F> {
        callback: F,
        failure: &'a mut Option<CatalogError>,
    }

    impl<'de, F> Visitor<'de> for RecordSeq<'_, F>
    where
        F: FnMut(CatalogRecord) -> Result<(), CatalogError>,
    {
        type Value = ();

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a JSON array of catalog records")
        }

        fn visit_seq<A: SeqAccess<'de>>(mut self, mut seq: A) -> Result<(), A::Error> {
            while let Some(record) = seq.next_element::<CatalogRecord>()? {
                if let Err(err) = (self.callback)(record) {
                    *self.failure = Some(err);
                    return Err(serde::de::Error::custom("record callback failed"));
                }
            }
            Ok(())
        }
    }

    impl<'de, F> DeserializeSeed<'de> for RecordSeq<'_, F>
    where
        F: FnMut(CatalogRecord) -> Result<(), CatalogError>,
    {
        type Value = ();

        fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
            deserializer.deserialize_seq(self)
        }
    }

    let mut failure = None;
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let result = RecordSeq {
        callback,
        failure: &mut failure,
    }
    .deserialize(&mut deserializer);

    match failure {
        Some(err) => Err(err),
        None => {
            result?;
            deserializer.end().map_err(CatalogError::from)
        }
    }
}

/// Load a catalog file (JSON array, gzip-optional) into canonical loci.
///
/// # Errors
///
/// Any per-record normalization failure aborts the load.
pub fn read_catalog(
    path: &Path,
    known: &KnownLociLookup,
    source: &str,
    compound: CompoundHandling,
) -> Result<Vec<Locus>, CatalogError> {
    let mut loci = Vec::new();
    for_each_record(open_reader(path)?, |record| {
        loci.extend(normalize_record(&record, known, source, compound)?);
        Ok(())
    })?;
    debug!(
        "Parsed {} loci from {}",
        loci.len(),
        path.display()
    );
    Ok(loci)
}

/// Write loci as a JSON array of catalog records (gzip-optional), streaming
/// one record at a time.
///
/// # Errors
///
/// Returns `CatalogError::Io`/`Json` on write failures.
pub fn write_catalog(path: &Path, loci: &[Locus]) -> Result<(), CatalogError> {
    let mut writer = create_writer(path)?;
    writer.write_all(b"[")?;
    for (i, locus) in loci.iter().enumerate() {
        if i > 0 {
            writer.write_all(b", ")?;
        }
        serde_json::to_writer_pretty(&mut writer, &record_from_locus(locus))?;
    }
    writer.write_all(b"]\n")?;
    writer.flush()?;
    Ok(())
}
