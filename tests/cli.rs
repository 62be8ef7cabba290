//! CLI integration tests driving the tr-catalog binary end to end.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_json_catalog(path: &Path) {
    fs::write(
        path,
        r#"[
  {"LocusId": "1-100-110-CAG", "ReferenceRegion": "chr1:100-110",
   "LocusStructure": "(CAG)*", "VariantType": "Repeat"},
  {"LocusId": "2-50-80-AT", "ReferenceRegion": "chr2:50-80",
   "LocusStructure": "(AT)*", "VariantType": "Repeat"}
]"#,
    )
    .unwrap();
}

fn write_bed_catalog(path: &Path) {
    fs::write(path, "chr1\t100\t110\tCAG\nchr3\t10\t40\tAAAG\n").unwrap();
}

fn tr_catalog() -> Command {
    Command::cargo_bin("tr-catalog").unwrap()
}

#[test]
fn test_merge_writes_catalog_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("first.json");
    let bed_path = dir.path().join("second.bed");
    write_json_catalog(&json_path);
    write_bed_catalog(&bed_path);

    tr_catalog()
        .current_dir(dir.path())
        .args([
            "merge",
            &format!("First:{}", json_path.display()),
            &format!("Second:{}", bed_path.display()),
            "--output-prefix",
            "out",
            "--write-outer-join-table",
            "--write-merge-stats-tsv",
            "--write-unique-loci-beds",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total merged loci: 3"));

    let merged = fs::read_to_string(dir.path().join("out.merged.json")).unwrap();
    assert!(merged.contains("\"LocusId\": \"1-100-110-CAG\""));
    assert!(merged.contains("\"Second\""));

    let stats = fs::read_to_string(dir.path().join("out.merge_stats.tsv")).unwrap();
    assert!(stats.contains("First\t2\t0"));
    assert!(stats.contains("Second\t1\t1"));

    assert!(dir.path().join("out.outer_join.tsv.gz").exists());
    let unique = fs::read_to_string(dir.path().join("out.unique_to_Second.bed")).unwrap();
    assert_eq!(unique, "chr3\t10\t40\tAAAG\n");
}

#[test]
fn test_merge_rejects_malformed_catalog_argument() {
    tr_catalog()
        .args(["merge", "no-colon-here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME:PATH"));
}

#[test]
fn test_compare_tsv_output() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("first.json");
    let bed_path = dir.path().join("second.bed");
    write_json_catalog(&json_path);
    write_bed_catalog(&bed_path);

    tr_catalog()
        .current_dir(dir.path())
        .args([
            "compare",
            "first.json",
            "second.bed",
            "--name-a",
            "A",
            "--name-b",
            "B",
            "--format",
            "tsv",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("LocusId\tA\tB"))
        .stdout(predicate::str::contains("1-100-110-CAG\tYes\tYes"))
        .stdout(predicate::str::contains("2-50-80-AT\tYes\tabsent"))
        .stdout(predicate::str::contains("3-10-40-AAAG\tabsent\tYes"));
}

#[test]
fn test_annotate_with_frequency_table() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("catalog.json");
    write_json_catalog(&json_path);
    fs::write(
        dir.path().join("freqs.tsv"),
        "VariantId\tRepeatNumbers\tAlleleCounts\tCanonicalMotif\n\
         chr1_100_110\t5,6\t10,2\tAGC\n",
    )
    .unwrap();

    tr_catalog()
        .current_dir(dir.path())
        .args([
            "annotate",
            "catalog.json",
            "--allele-frequencies",
            "freqs.tsv",
            "--frequency-label",
            "Illumina174k",
            "-o",
            "annotated.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 exact"));

    let annotated = fs::read_to_string(dir.path().join("annotated.json")).unwrap();
    assert!(annotated.contains("\"AlleleFrequenciesFromIllumina174k\": \"5x:10,6x:2\""));
}

#[test]
fn test_stats_text_output() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("catalog.json");
    write_json_catalog(&json_path);

    tr_catalog()
        .current_dir(dir.path())
        .args(["stats", "catalog.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loci: 2"))
        .stdout(predicate::str::contains("Chromosomes: 2"));
}
