//! Parsers and writers for the catalog and side-table formats.
//!
//! - [`json`]: ExpansionHunter-style JSON catalogs (gzip-optional, streamed)
//! - [`bed`]: BED-style locus rows and generic BED records
//! - [`table`]: header-indexed TSV tables (LPS, allele-frequency tables)

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::error::CatalogError;

pub mod bed;
pub mod json;
pub mod table;

/// Open a file for buffered reading, decompressing transparently when the
/// path ends in `.gz`.
///
/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be opened.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>, CatalogError> {
    let file = File::open(path)?;
    if is_gzip_path(path) {
        Ok(Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(
            file,
        ))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Create a file for buffered writing, compressing when the path ends in
/// `.gz`.
///
/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be created.
pub fn create_writer(path: &Path) -> Result<Box<dyn Write>, CatalogError> {
    let file = File::create(path)?;
    if is_gzip_path(path) {
        Ok(Box::new(BufWriter::new(GzEncoder::new(
            file,
            Compression::default(),
        ))))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_gzip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt.gz");

        let mut writer = create_writer(&path).unwrap();
        writer.write_all(b"chr1\t100\t110\tCAG\n").unwrap();
        drop(writer);

        let mut text = String::new();
        open_reader(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "chr1\t100\t110\tCAG\n");
    }

    #[test]
    fn test_plain_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");

        let mut writer = create_writer(&path).unwrap();
        writer.write_all(b"plain").unwrap();
        drop(writer);

        let mut text = String::new();
        open_reader(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "plain");
    }
}
