use std::path::{Path, PathBuf};

use clap::Args;

use crate::annotation::clusters::VariationClusters;
use crate::annotation::joiner::{AnnotationJoiner, FrequencyTable, JoinStrategy};
use crate::annotation::lps::LpsTable;
use crate::parsing::json;

#[derive(Args)]
pub struct AnnotateArgs {
    /// Catalog to annotate (JSON or BED, optionally gzipped)
    #[arg(required = true)]
    pub catalog: PathBuf,

    /// Output JSON path (defaults to the input with `.annotated.json`)
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Catalog of known disease-associated loci, used to resolve their ids
    /// in side tables
    #[arg(long)]
    pub known_loci_json: Option<PathBuf>,

    /// Allele-frequency TSV with VariantId/RepeatNumbers/AlleleCounts
    /// columns (CanonicalMotif enables the overlap fallback)
    #[arg(long)]
    pub allele_frequencies: Option<PathBuf>,

    /// Label embedded in the attached field names, e.g.
    /// AlleleFrequenciesFrom<LABEL>
    #[arg(long, default_value = "T2TAssemblies")]
    pub frequency_label: String,

    /// Fall back to motif-compatible overlap search when exact coordinates
    /// don't match
    #[arg(long)]
    pub allow_overlap_fallback: bool,

    /// Correct fallback histograms for the locus-size difference
    #[arg(long)]
    pub adjust_boundaries: bool,

    /// Longest-pure-segment quantile table
    #[arg(long)]
    pub lps_table: Option<PathBuf>,

    /// Label for the LPS field names
    #[arg(long, default_value = "HPRC100")]
    pub lps_label: String,

    /// Variation clusters BED with ID info fields
    #[arg(long)]
    pub variation_clusters: Option<PathBuf>,
}

pub fn run(args: AnnotateArgs, _format: super::OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let known = super::load_known(args.known_loci_json.as_deref())?;
    let mut loci = super::load_catalog_file(&args.catalog, &known, "input")?;
    if verbose {
        eprintln!("Loaded {} loci from {}", loci.len(), args.catalog.display());
    }

    if let Some(path) = &args.allele_frequencies {
        let table = FrequencyTable::load(path)?;
        let joiner = AnnotationJoiner::new(
            &args.frequency_label,
            JoinStrategy {
                allow_overlap_fallback: args.allow_overlap_fallback,
                adjust_boundaries: args.adjust_boundaries,
            },
        );
        let (annotated, stats) = joiner.attach(&loci, &table)?;
        loci = annotated;
        println!(
            "Allele frequencies: {} exact, {} via overlap, {} unannotated, \
             {} incompatible size corrections",
            stats.exact_matches,
            stats.fallback_matches,
            stats.unannotated,
            stats.negative_repeat_counts
        );
    }

    if let Some(path) = &args.lps_table {
        let lps = LpsTable::load(path, &known, &args.lps_label)?;
        let (annotated, count) = lps.annotate(&loci);
        loci = annotated;
        println!("LPS annotations: {count} of {} loci", loci.len());
    }

    if let Some(path) = &args.variation_clusters {
        let clusters = VariationClusters::load(path, &known)?;
        let (annotated, count) = clusters.annotate(&loci);
        loci = annotated;
        println!("Variation clusters: {count} of {} loci", loci.len());
    }

    let output_path = args.output_path.unwrap_or_else(|| default_output(&args.catalog));
    json::write_catalog(&output_path, &loci)?;
    println!("Wrote {} records to {}", loci.len(), output_path.display());
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .trim_end_matches(".gz")
        .trim_end_matches(".json")
        .trim_end_matches(".bed");
    input.with_file_name(format!("{stem}.annotated.json"))
}
