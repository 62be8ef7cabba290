use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::cli::OutputFormat;
use crate::matching::classifier::{OverlapClassifier, OverlapRecord, DEFAULT_OVERLAP_FRACTION};
use crate::parsing::create_writer;

#[derive(Args)]
pub struct CompareArgs {
    /// First catalog (JSON or BED, optionally gzipped)
    #[arg(required = true)]
    pub input_a: PathBuf,

    /// Second catalog
    #[arg(required = true)]
    pub input_b: PathBuf,

    /// Name for the first catalog in the output (defaults to the file stem)
    #[arg(long)]
    pub name_a: Option<String>,

    /// Name for the second catalog in the output
    #[arg(long)]
    pub name_b: Option<String>,

    /// Minimum overlap, as a fraction of the smaller interval, for two
    /// differently-keyed loci to count as the same repeat
    #[arg(long, default_value_t = DEFAULT_OVERLAP_FRACTION)]
    pub overlap_fraction: f64,

    /// Catalog of known disease-associated loci, used to preserve their ids
    #[arg(long)]
    pub known_loci_json: Option<PathBuf>,

    /// Also write the per-locus records as TSV (gzip-optional)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let known = super::load_known(args.known_loci_json.as_deref())?;

    let name_a = catalog_name(args.name_a.as_deref(), &args.input_a);
    let name_b = catalog_name(args.name_b.as_deref(), &args.input_b);

    let loci_a = super::load_catalog_file(&args.input_a, &known, &name_a)?;
    let loci_b = super::load_catalog_file(&args.input_b, &known, &name_b)?;
    if verbose {
        eprintln!("{name_a}: {} loci", loci_a.len());
        eprintln!("{name_b}: {} loci", loci_b.len());
    }

    let classifier = OverlapClassifier::new(args.overlap_fraction);
    let records = classifier.classify_pair(&name_a, &loci_a, &name_b, &loci_b)?;

    if let Some(path) = &args.output {
        write_records_tsv(path, &name_a, &name_b, &records)?;
        eprintln!("Wrote {} records to {}", records.len(), path.display());
    }

    match format {
        OutputFormat::Text => print_text(&name_a, &name_b, &records),
        OutputFormat::Json => print_json(&name_a, &name_b, &records)?,
        OutputFormat::Tsv => print_tsv(&name_a, &name_b, &records),
    }

    Ok(())
}

fn catalog_name(explicit: Option<&str>, path: &Path) -> String {
    if let Some(name) = explicit {
        return name.to_string();
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn status_counts(records: &[OverlapRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts
            .entry(format!("{} / {}", record.left, record.right))
            .or_insert(0) += 1;
    }
    counts
}

fn print_text(name_a: &str, name_b: &str, records: &[OverlapRecord]) {
    println!("Comparison Results");
    println!("{}", "=".repeat(60));
    println!("\nCatalog A: {name_a}");
    println!("Catalog B: {name_b}");
    println!("Union loci: {}", records.len());

    println!("\nStatus counts (A / B):");
    for (statuses, count) in status_counts(records) {
        println!("  {statuses}: {count}");
    }

    let in_both = records
        .iter()
        .filter(|r| r.left.is_present() && r.right.is_present())
        .count();
    println!("\nPresent in both: {in_both}");
    println!(
        "Unique to {}: {}",
        name_a,
        records.iter().filter(|r| !r.right.is_present()).count()
    );
    println!(
        "Unique to {}: {}",
        name_b,
        records.iter().filter(|r| !r.left.is_present()).count()
    );
}

fn print_json(name_a: &str, name_b: &str, records: &[OverlapRecord]) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "catalog_a": name_a,
        "catalog_b": name_b,
        "union_loci": records.len(),
        "status_counts": status_counts(records),
        "records": records,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(name_a: &str, name_b: &str, records: &[OverlapRecord]) {
    println!("LocusId\t{name_a}\t{name_b}");
    for record in records {
        println!("{}\t{}\t{}", record.locus_id, record.left, record.right);
    }
}

fn write_records_tsv(
    path: &Path,
    name_a: &str,
    name_b: &str,
    records: &[OverlapRecord],
) -> Result<(), crate::core::error::CatalogError> {
    let mut writer = create_writer(path)?;
    writeln!(writer, "LocusId\t{name_a}\t{name_b}")?;
    for record in records {
        writeln!(writer, "{}\t{}\t{}", record.locus_id, record.left, record.right)?;
    }
    writer.flush()?;
    Ok(())
}
