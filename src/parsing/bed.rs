//! BED-style inputs: locus rows (`chrom, start0, end1, motif[, motif_size]`)
//! and generic records whose column 4 holds `key=value;...` info fields
//! (variation-cluster catalogs).

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::warn;

use crate::core::error::CatalogError;
use crate::core::locus::Locus;
use crate::parsing::{create_writer, open_reader};
use crate::utils::motif::with_chr;

/// Parse a BED-style locus catalog, one locus per row. Comment, `track`, and
/// `browser` lines are skipped; files may be gzip-compressed.
///
/// # Errors
///
/// Rows with fewer than four columns or non-numeric coordinates fail with
/// `CatalogError::InvalidFormat`; degenerate intervals fail with
/// `CatalogError::InvalidInterval`. Either aborts the whole load.
pub fn read_bed_catalog(path: &Path, source: &str) -> Result<Vec<Locus>, CatalogError> {
    let reader = open_reader(path)?;
    let mut loci = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if is_skippable(line) {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(CatalogError::InvalidFormat(format!(
                "{}: line {} has {} fields, expected at least 4",
                path.display(),
                i + 1,
                fields.len()
            )));
        }

        let start = parse_coord(fields[1], path, i + 1)?;
        let end = parse_coord(fields[2], path, i + 1)?;
        loci.push(Locus::new(fields[0], start, end, fields[3], source)?);
    }

    Ok(loci)
}

/// A generic BED row with its info fields parsed out of column 4.
#[derive(Debug, Clone)]
pub struct BedRecord {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// `key=value` pairs from column 4, in file order of first occurrence.
    pub info: HashMap<String, String>,
}

/// Parse a BED file whose column 4 holds semicolon-delimited `key=value`
/// info fields. Malformed pairs are logged and skipped, matching the
/// permissive handling of the upstream cluster catalogs.
///
/// # Errors
///
/// Structural problems (too few columns, bad coordinates) abort the load.
pub fn read_info_bed(path: &Path) -> Result<Vec<BedRecord>, CatalogError> {
    let reader = open_reader(path)?;
    let mut records = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if is_skippable(line) {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(CatalogError::InvalidFormat(format!(
                "{}: line {} has {} fields, expected at least 4",
                path.display(),
                i + 1,
                fields.len()
            )));
        }

        let mut info = HashMap::new();
        for pair in fields[3].split(';') {
            match pair.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    info.entry(key.to_string()).or_insert_with(|| value.to_string());
                }
                _ => warn!(
                    "skipping invalid key-value pair '{}' on line {} of {}",
                    pair,
                    i + 1,
                    path.display()
                ),
            }
        }

        records.push(BedRecord {
            chrom: fields[0].to_string(),
            start: parse_coord(fields[1], path, i + 1)?,
            end: parse_coord(fields[2], path, i + 1)?,
            info,
        });
    }

    Ok(records)
}

/// Write loci as 4-column BED rows (`chr`-prefixed chromosome, start, end,
/// motif), gzip-optional.
///
/// # Errors
///
/// Returns `CatalogError::Io` on write failures.
pub fn write_bed(path: &Path, loci: &[Locus]) -> Result<(), CatalogError> {
    let mut writer = create_writer(path)?;
    for locus in loci {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            with_chr(&locus.chrom),
            locus.start,
            locus.end,
            locus.motif
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn is_skippable(line: &str) -> bool {
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

fn parse_coord(field: &str, path: &Path, line: usize) -> Result<u64, CatalogError> {
    field.parse().map_err(|_| {
        CatalogError::InvalidFormat(format!(
            "{}: invalid coordinate '{}' on line {}",
            path.display(),
            field,
            line
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut writer = create_writer(&path).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
        drop(writer);
        (dir, path)
    }

    #[test]
    fn test_read_bed_catalog() {
        let (_dir, path) = write_temp(
            "loci.bed",
            "# comment\ntrack name=repeats\nchr1\t100\t110\tCAG\nchr2\t5\t25\tAT\t2\n",
        );
        let loci = read_bed_catalog(&path, "bedsource").unwrap();
        assert_eq!(loci.len(), 2);
        assert_eq!(loci[0].id, "1-100-110-CAG");
        assert_eq!(loci[1].id, "2-5-25-AT");
        assert_eq!(loci[1].source, "bedsource");
    }

    #[test]
    fn test_read_bed_catalog_gz() {
        let (_dir, path) = write_temp("loci.bed.gz", "chr1\t100\t110\tCAG\n");
        let loci = read_bed_catalog(&path, "s").unwrap();
        assert_eq!(loci.len(), 1);
    }

    #[test]
    fn test_read_bed_catalog_rejects_short_rows() {
        let (_dir, path) = write_temp("loci.bed", "chr1\t100\t110\n");
        assert!(matches!(
            read_bed_catalog(&path, "s").unwrap_err(),
            CatalogError::InvalidFormat(_)
        ));
    }

    #[test]
    fn test_read_bed_catalog_rejects_degenerate_interval() {
        let (_dir, path) = write_temp("loci.bed", "chr1\t110\t100\tCAG\n");
        assert!(matches!(
            read_bed_catalog(&path, "s").unwrap_err(),
            CatalogError::InvalidInterval { .. }
        ));
    }

    #[test]
    fn test_read_info_bed() {
        let (_dir, path) = write_temp(
            "clusters.bed",
            "chr1\t95\t130\tID=1-100-110-CAG,1-112-120-AT;MOTIFS=CAG\nchr2\t10\t40\tID=2-12-30-AAAG;bogus\n",
        );
        let records = read_info_bed(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].info["ID"], "1-100-110-CAG,1-112-120-AT");
        assert_eq!(records[0].info["MOTIFS"], "CAG");
        // the malformed 'bogus' pair is skipped, the valid one kept
        assert_eq!(records[1].info.len(), 1);
    }

    #[test]
    fn test_write_bed_restores_chr_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bed");
        let loci = vec![Locus::new("1", 100, 110, "CAG", "s").unwrap()];
        write_bed(&path, &loci).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "chr1\t100\t110\tCAG\n");
    }
}
