//! Outer-join membership table: one row per merged locus, one status column
//! per source catalog.

use std::io::Write;
use std::path::Path;

use crate::catalog::merger::MergedCatalog;
use crate::catalog::store::LocusCatalog;
use crate::core::error::CatalogError;
use crate::core::locus::Locus;
use crate::core::types::{relate_intervals, IntervalRelation, OverlapStatus};
use crate::parsing::create_writer;

/// Membership/classification of every merged locus across all sources.
#[derive(Debug)]
pub struct OuterJoinTable {
    pub catalog_names: Vec<String>,
    pub rows: Vec<OuterJoinRow>,
}

#[derive(Debug, Clone)]
pub struct OuterJoinRow {
    pub locus_id: String,
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub motif: String,
    /// One status per catalog, in `catalog_names` order: how that catalog's
    /// definition relates to the merged definition.
    pub statuses: Vec<OverlapStatus>,
}

impl OuterJoinTable {
    /// Build the table by classifying each source catalog's definition of
    /// every merged locus. Rows with fewer than `min_sources` non-absent
    /// statuses are dropped.
    ///
    /// # Errors
    ///
    /// Propagates index-construction failures for unnormalized loci.
    pub fn build(
        merged: &MergedCatalog,
        catalogs: &[(String, Vec<Locus>)],
        overlap_fraction: f64,
        min_sources: usize,
    ) -> Result<Self, CatalogError> {
        let sides: Vec<LocusCatalog> = catalogs
            .iter()
            .map(|(name, loci)| LocusCatalog::new(name, loci.clone()))
            .collect::<Result<_, _>>()?;

        let mut rows = Vec::with_capacity(merged.loci.len());
        for locus in &merged.loci {
            let statuses: Vec<OverlapStatus> = sides
                .iter()
                .map(|side| classify_against(locus, side, overlap_fraction))
                .collect();

            if statuses.iter().filter(|s| s.is_present()).count() >= min_sources {
                rows.push(OuterJoinRow {
                    locus_id: locus.id.clone(),
                    chrom: locus.chrom.clone(),
                    start: locus.start,
                    end: locus.end,
                    motif: locus.motif.clone(),
                    statuses,
                });
            }
        }

        Ok(Self {
            catalog_names: catalogs.iter().map(|(name, _)| name.clone()).collect(),
            rows,
        })
    }

    /// Write the table as TSV (gzip-optional).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` on write failures.
    pub fn write_tsv(&self, path: &Path) -> Result<(), CatalogError> {
        let mut writer = create_writer(path)?;
        writeln!(
            writer,
            "LocusId\tChrom\tStart0Based\tEnd1Based\tMotif\t{}",
            self.catalog_names.join("\t")
        )?;
        for row in &self.rows {
            let statuses: Vec<String> = row.statuses.iter().map(ToString::to_string).collect();
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                row.locus_id,
                row.chrom,
                row.start,
                row.end,
                row.motif,
                statuses.join("\t")
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// How `side`'s definition of this locus relates to the merged definition.
fn classify_against(locus: &Locus, side: &LocusCatalog, overlap_fraction: f64) -> OverlapStatus {
    match side.find_candidate(locus, overlap_fraction) {
        None => OverlapStatus::Absent,
        Some(candidate) => match relate_intervals(candidate.interval(), locus.interval()) {
            IntervalRelation::Identical => OverlapStatus::Yes,
            IntervalRelation::Shifted => OverlapStatus::YesButShifted,
            IntervalRelation::FirstInsideSecond => OverlapStatus::YesButNarrower,
            IntervalRelation::SecondInsideFirst => OverlapStatus::YesButWider,
            IntervalRelation::Neither => OverlapStatus::Absent,
        },
    }
}
