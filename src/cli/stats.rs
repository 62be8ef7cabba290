use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::locus::Locus;

#[derive(Args)]
pub struct StatsArgs {
    /// Catalog to summarize (JSON or BED, optionally gzipped)
    #[arg(required = true)]
    pub catalog: PathBuf,

    /// Catalog of known disease-associated loci, used to preserve their ids
    #[arg(long)]
    pub known_loci_json: Option<PathBuf>,
}

#[derive(Debug)]
struct CatalogSummary {
    total: usize,
    chromosomes: usize,
    motif_size_counts: BTreeMap<String, usize>,
    source_counts: BTreeMap<String, usize>,
    flagged_motifs: usize,
    length_quartiles: Option<[u64; 5]>,
}

pub fn run(args: StatsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let known = super::load_known(args.known_loci_json.as_deref())?;
    let loci = super::load_catalog_file(&args.catalog, &known, "input")?;
    if verbose {
        eprintln!("Loaded {} loci from {}", loci.len(), args.catalog.display());
    }

    let summary = summarize(&loci);
    match format {
        OutputFormat::Text => print_text(&summary),
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Tsv => print_tsv(&summary),
    }
    Ok(())
}

fn summarize(loci: &[Locus]) -> CatalogSummary {
    let mut chromosomes = std::collections::HashSet::new();
    let mut motif_size_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut source_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut flagged_motifs = 0usize;
    let mut lengths: Vec<u64> = Vec::with_capacity(loci.len());

    for locus in loci {
        chromosomes.insert(locus.chrom.as_str());
        *motif_size_counts
            .entry(motif_size_bucket(locus.motif.len()))
            .or_insert(0) += 1;
        for source in &locus.found_in {
            *source_counts.entry(source.clone()).or_insert(0) += 1;
        }
        if locus.non_acgtn_motif {
            flagged_motifs += 1;
        }
        lengths.push(locus.len());
    }

    lengths.sort_unstable();
    let length_quartiles = if lengths.is_empty() {
        None
    } else {
        Some([
            lengths[0],
            lengths[lengths.len() / 4],
            lengths[lengths.len() / 2],
            lengths[lengths.len() * 3 / 4],
            lengths[lengths.len() - 1],
        ])
    };

    CatalogSummary {
        total: loci.len(),
        chromosomes: chromosomes.len(),
        motif_size_counts,
        source_counts,
        flagged_motifs,
        length_quartiles,
    }
}

fn motif_size_bucket(len: usize) -> String {
    match len {
        0..=6 => format!("{len}bp"),
        _ => "7+bp".to_string(),
    }
}

fn print_text(summary: &CatalogSummary) {
    println!("Catalog Summary");
    println!("{}", "=".repeat(60));
    println!("  Loci: {}", summary.total);
    println!("  Chromosomes: {}", summary.chromosomes);
    println!("  Loci with non-ACGTN motifs: {}", summary.flagged_motifs);

    println!("\nMotif sizes:");
    for (bucket, count) in &summary.motif_size_counts {
        println!("  {bucket}: {count}");
    }

    if !summary.source_counts.is_empty() {
        println!("\nLoci per source:");
        for (source, count) in &summary.source_counts {
            println!("  {source}: {count}");
        }
    }

    if let Some([min, q25, median, q75, max]) = summary.length_quartiles {
        println!("\nInterval lengths (bp):");
        println!("  min: {min}  q25: {q25}  median: {median}  q75: {q75}  max: {max}");
    }
}

fn print_json(summary: &CatalogSummary) -> anyhow::Result<()> {
    let quartiles = summary.length_quartiles.map(|[min, q25, median, q75, max]| {
        serde_json::json!({
            "min": min, "q25": q25, "median": median, "q75": q75, "max": max
        })
    });
    let output = serde_json::json!({
        "loci": summary.total,
        "chromosomes": summary.chromosomes,
        "non_acgtn_motifs": summary.flagged_motifs,
        "motif_sizes": summary.motif_size_counts,
        "loci_per_source": summary.source_counts,
        "interval_lengths": quartiles,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(summary: &CatalogSummary) {
    println!("metric\tvalue");
    println!("loci\t{}", summary.total);
    println!("chromosomes\t{}", summary.chromosomes);
    println!("non_acgtn_motifs\t{}", summary.flagged_motifs);
    for (bucket, count) in &summary.motif_size_counts {
        println!("motif_size_{bucket}\t{count}");
    }
    for (source, count) in &summary.source_counts {
        println!("source_{source}\t{count}");
    }
}
