//! Lookup of known disease-associated loci.
//!
//! Ids of known pathogenic loci (`HTT`, `FXN`, ...) carry no embedded
//! coordinates, unlike the `chrom-start0-end1-motif` ids used everywhere
//! else. This lookup recovers their original boundaries and motifs so that
//! annotation tables keyed by locus id can be resolved for both id forms.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::core::error::CatalogError;
use crate::core::locus::{parse_locus_id, parse_region};
use crate::parsing::json::{for_each_record, CatalogRecord, OneOrMany};
use crate::parsing::open_reader;
use crate::utils::motif::parse_motifs_from_structure;

/// Coordinates and motif of a known disease-associated locus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownLocus {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub motif: String,
}

/// Map from externally supplied locus/variant ids to their definitions.
#[derive(Debug, Default)]
pub struct KnownLociLookup {
    loci: HashMap<String, KnownLocus>,
}

impl KnownLociLookup {
    /// Load from an ExpansionHunter-style catalog of known pathogenic loci.
    /// Compound entries contribute one mapping per `VariantId`.
    ///
    /// # Errors
    ///
    /// `CatalogError::SchemaMismatch` when a compound entry's
    /// `ReferenceRegion`, `VariantId`, and structure motifs disagree in
    /// length; parse errors propagate.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let mut lookup = Self::default();
        for_each_record(open_reader(path)?, |record| lookup.add_record(&record))?;
        info!(
            "Parsed {} known disease-associated loci from {}",
            lookup.loci.len(),
            path.display()
        );
        Ok(lookup)
    }

    fn add_record(&mut self, record: &CatalogRecord) -> Result<(), CatalogError> {
        let motifs = parse_motifs_from_structure(&record.locus_structure)?;
        match &record.reference_region {
            OneOrMany::One(region) => {
                let (chrom, start, end) = parse_region(region)?;
                self.loci.insert(
                    record.locus_id.clone(),
                    KnownLocus {
                        chrom,
                        start,
                        end,
                        motif: motifs[0].clone(),
                    },
                );
            }
            OneOrMany::Many(regions) => {
                let variant_ids = record
                    .variant_id
                    .as_ref()
                    .map(OneOrMany::to_vec)
                    .ok_or_else(|| {
                        CatalogError::SchemaMismatch(format!(
                            "known locus '{}' has list-valued ReferenceRegion but no VariantId",
                            record.locus_id
                        ))
                    })?;
                if variant_ids.len() != regions.len() || motifs.len() != regions.len() {
                    return Err(CatalogError::SchemaMismatch(format!(
                        "known locus '{}': {} regions, {} variant ids, {} motifs",
                        record.locus_id,
                        regions.len(),
                        variant_ids.len(),
                        motifs.len()
                    )));
                }
                for ((variant_id, region), motif) in variant_ids.iter().zip(regions).zip(&motifs) {
                    let (chrom, start, end) = parse_region(region)?;
                    self.loci.insert(
                        variant_id.clone(),
                        KnownLocus {
                            chrom,
                            start,
                            end,
                            motif: motif.clone(),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// Register a known locus directly.
    pub fn insert(&mut self, id: &str, chrom: &str, start: u64, end: u64, motif: &str) {
        self.loci.insert(
            id.to_string(),
            KnownLocus {
                chrom: chrom.to_string(),
                start,
                end,
                motif: motif.to_string(),
            },
        );
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.loci.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&KnownLocus> {
        self.loci.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loci.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    /// Resolve a locus id to its definition: known ids come from the lookup,
    /// everything else must parse as `chrom-start0-end1-motif`.
    ///
    /// # Errors
    ///
    /// `CatalogError::UnexpectedIdFormat` when the id matches neither form;
    /// downstream boundary arithmetic depends on one of the two.
    pub fn resolve_or_parse(&self, id: &str) -> Result<KnownLocus, CatalogError> {
        if let Some(known) = self.loci.get(id) {
            return Ok(known.clone());
        }
        let (chrom, start, end, motif) = parse_locus_id(id)?;
        Ok(KnownLocus {
            chrom,
            start,
            end,
            motif,
        })
    }
}
