use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::catalog::merger::{CatalogMerger, MergedCatalog};
use crate::core::types::OverlapPolicy;
use crate::matching::outer_join::OuterJoinTable;
use crate::parsing::{bed, create_writer, json};

#[derive(Args)]
pub struct MergeArgs {
    /// Source catalogs as NAME:PATH, in precedence order (earlier catalogs
    /// win overlapping same-motif loci). JSON or BED, optionally gzipped.
    #[arg(required = true)]
    pub catalogs: Vec<String>,

    /// Prefix for all output files
    #[arg(short, long, default_value = "merged_catalog")]
    pub output_prefix: String,

    /// How to resolve overlapping same-motif loci
    #[arg(long, value_enum, default_value = "keep-first")]
    pub overlapping_loci_action: PolicyArg,

    /// Catalog of known disease-associated loci, used to preserve their ids
    #[arg(long)]
    pub known_loci_json: Option<PathBuf>,

    /// Minimum overlap (fraction of the smaller interval) for the outer-join
    /// status columns
    #[arg(long, default_value_t = 0.01)]
    pub overlap_fraction: f64,

    /// Write <prefix>.outer_join.tsv.gz with one status column per source
    #[arg(long)]
    pub write_outer_join_table: bool,

    /// Drop outer-join rows present in fewer than this many sources
    #[arg(long, default_value_t = 1)]
    pub min_sources: usize,

    /// Write <prefix>.merge_stats.tsv with per-source accept/discard counts
    #[arg(long)]
    pub write_merge_stats_tsv: bool,

    /// Write one BED file per source holding the loci unique to it
    #[arg(long)]
    pub write_unique_loci_beds: bool,

    /// Gzip-compress the merged catalog JSON
    #[arg(long)]
    pub gzip: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum PolicyArg {
    KeepFirst,
    MergeAdjacentSameMotif,
}

impl From<PolicyArg> for OverlapPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::KeepFirst => OverlapPolicy::KeepFirst,
            PolicyArg::MergeAdjacentSameMotif => OverlapPolicy::MergeAdjacentSameMotif,
        }
    }
}

pub fn run(args: MergeArgs, _format: super::OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let known = super::load_known(args.known_loci_json.as_deref())?;

    let mut catalogs = Vec::with_capacity(args.catalogs.len());
    for entry in &args.catalogs {
        let (name, path) = entry.split_once(':').ok_or_else(|| {
            anyhow::anyhow!("catalog argument '{entry}' is not in NAME:PATH form")
        })?;
        let loci = super::load_catalog_file(Path::new(path), &known, name)?;
        if verbose {
            eprintln!("{name}: loaded {} loci from {path}", loci.len());
        }
        catalogs.push((name.to_string(), loci));
    }

    let merger = CatalogMerger::new(args.overlapping_loci_action.into());
    let merged = merger.merge(&catalogs)?;

    let suffix = if args.gzip { ".merged.json.gz" } else { ".merged.json" };
    let catalog_path = PathBuf::from(format!("{}{}", args.output_prefix, suffix));
    json::write_catalog(&catalog_path, &merged.loci)?;
    println!("Wrote {} loci to {}", merged.loci.len(), catalog_path.display());

    if args.write_merge_stats_tsv {
        let stats_path = PathBuf::from(format!("{}.merge_stats.tsv", args.output_prefix));
        write_merge_stats(&stats_path, &merged)?;
        println!("Wrote merge stats to {}", stats_path.display());
    }

    if args.write_outer_join_table {
        let table = OuterJoinTable::build(
            &merged,
            &catalogs,
            args.overlap_fraction,
            args.min_sources,
        )?;
        let table_path = PathBuf::from(format!("{}.outer_join.tsv.gz", args.output_prefix));
        table.write_tsv(&table_path)?;
        println!(
            "Wrote outer-join table with {} rows to {}",
            table.rows.len(),
            table_path.display()
        );
    }

    if args.write_unique_loci_beds {
        for (name, _) in &catalogs {
            let unique: Vec<_> = merged.unique_to(name).into_iter().cloned().collect();
            let bed_path =
                PathBuf::from(format!("{}.unique_to_{}.bed", args.output_prefix, name));
            bed::write_bed(&bed_path, &unique)?;
            println!(
                "Wrote {} loci unique to {} to {}",
                unique.len(),
                name,
                bed_path.display()
            );
        }
    }

    print_summary(&merged);
    Ok(())
}

fn write_merge_stats(
    path: &Path,
    merged: &MergedCatalog,
) -> Result<(), crate::core::error::CatalogError> {
    let mut writer = create_writer(path)?;
    writeln!(writer, "Source\tAccepted\tDiscardedAsDuplicate")?;
    for stats in &merged.source_stats {
        writeln!(
            writer,
            "{}\t{}\t{}",
            stats.name, stats.accepted, stats.discarded_as_duplicate
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(merged: &MergedCatalog) {
    println!("\nMerge Summary");
    println!("{}", "=".repeat(60));
    for stats in &merged.source_stats {
        println!(
            "  {}: {} accepted, {} discarded as duplicates",
            stats.name, stats.accepted, stats.discarded_as_duplicate
        );
    }
    println!("  Total merged loci: {}", merged.loci.len());
}
