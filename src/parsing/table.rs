//! Header-indexed TSV tables (allele-frequency and LPS side tables).

use std::io::BufRead;
use std::path::Path;

use crate::core::error::CatalogError;
use crate::parsing::open_reader;

/// A tab-separated table loaded into memory with column access by name.
///
/// Side tables are orders of magnitude smaller than the catalogs themselves
/// and are read whole, matching the original pipeline's behavior.
#[derive(Debug)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a TSV file (gzip-optional). The first non-empty, non-comment line
    /// is the header.
    ///
    /// # Errors
    ///
    /// `CatalogError::InvalidFormat` if the file has no header row.
    pub fn read(path: &Path) -> Result<Self, CatalogError> {
        let reader = open_reader(path)?;
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<String> = line.split('\t').map(str::to_string).collect();
            match &columns {
                None => columns = Some(fields),
                Some(_) => rows.push(fields),
            }
        }

        let columns = columns.ok_or_else(|| {
            CatalogError::InvalidFormat(format!("{}: no header row found", path.display()))
        })?;
        Ok(Self { columns, rows })
    }

    /// Verify that all `required` columns are present.
    ///
    /// # Errors
    ///
    /// `CatalogError::InvalidFormat` naming every missing column.
    pub fn require_columns(&self, path: &Path, required: &[&str]) -> Result<(), CatalogError> {
        let missing: Vec<&str> = required
            .iter()
            .filter(|name| !self.columns.iter().any(|c| c == *name))
            .copied()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::InvalidFormat(format!(
                "{} is missing expected columns: {}",
                path.display(),
                missing.join(", ")
            )))
        }
    }

    /// Column index by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The value of `name` in `row`, if the column exists and the row is wide
    /// enough. Empty cells come back as `Some("")`.
    #[must_use]
    pub fn get<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.column(name)
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.tsv");
        let mut writer = crate::parsing::create_writer(&path).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
        drop(writer);
        (dir, path)
    }

    #[test]
    fn test_read_table() {
        let (_dir, path) = write_temp("TRID\tStdev\n1-100-110-CAG\t2.5\n1-200-230-AT\t\n");
        let table = Table::read(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&table.rows()[0], "TRID"), Some("1-100-110-CAG"));
        assert_eq!(table.get(&table.rows()[0], "Stdev"), Some("2.5"));
        assert_eq!(table.get(&table.rows()[1], "Stdev"), Some(""));
        assert_eq!(table.get(&table.rows()[0], "Missing"), None);
    }

    #[test]
    fn test_require_columns() {
        let (_dir, path) = write_temp("TRID\tStdev\n");
        let table = Table::read(&path).unwrap();
        assert!(table.require_columns(&path, &["TRID", "Stdev"]).is_ok());

        let err = table
            .require_columns(&path, &["TRID", "N_motif"])
            .unwrap_err();
        assert!(err.to_string().contains("N_motif"));
    }

    #[test]
    fn test_empty_file_is_invalid() {
        let (_dir, path) = write_temp("");
        assert!(matches!(
            Table::read(&path).unwrap_err(),
            CatalogError::InvalidFormat(_)
        ));
    }
}
