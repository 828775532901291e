//! Reads identifiers out of a delimited text file with a header row.
//!
//! Extraction is lazy: [`RecordExtractor::extract`] only opens the file and
//! locates the identifier column. Rows are parsed one at a time as the
//! returned [`Identifiers`] iterator is advanced, and the file handle is
//! closed when the iterator is dropped, whether it was exhausted or not.
//!
//! Any unreadable or malformed row ends the sequence with a [`ParseError`];
//! nothing after it is yielded. Rows whose identifier cell is blank are
//! skipped.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::CreatorConfig;
use crate::identifier::Identifier;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unable to open source file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source file {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Unable to read source file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Parses source files into identifier sequences.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    column: String,
    delimiter: u8,
}

impl RecordExtractor {
    pub fn new(config: &CreatorConfig) -> Self {
        RecordExtractor {
            column: config.column.clone(),
            delimiter: config.delimiter,
        }
    }

    /// Opens `path`, reads its header row and returns a lazy sequence over
    /// the identifier column.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Open`] if the file cannot be opened,
    /// [`ParseError::Csv`] if the header row cannot be read, and
    /// [`ParseError::MissingColumn`] if no header matches the configured column.
    #[instrument(skip(self), fields(path = %path.display(), column = %self.column))]
    pub fn extract(&self, path: &Path) -> Result<Identifiers, ParseError> {
        let file = File::open(path).map_err(|source| ParseError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers().map_err(|source| ParseError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let column_index = headers
            .iter()
            .position(|header| header_matches(header, &self.column))
            .ok_or_else(|| ParseError::MissingColumn {
                path: path.to_path_buf(),
                column: self.column.clone(),
            })?;
        debug!(column_index, "Located identifier column");

        Ok(Identifiers {
            records: reader.into_records(),
            column_index,
            path: path.to_path_buf(),
            finished: false,
        })
    }
}

// Header cells are compared without surrounding whitespace or a leading BOM.
fn header_matches(header: &str, column: &str) -> bool {
    header.trim_start_matches('\u{feff}').trim() == column.trim()
}

/// Single-pass sequence of identifiers read from one source file.
pub struct Identifiers {
    records: csv::StringRecordsIntoIter<File>,
    column_index: usize,
    path: PathBuf,
    finished: bool,
}

impl Iterator for Identifiers {
    type Item = Result<Identifier, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let record = match self.records.next() {
                Some(Ok(record)) => record,
                Some(Err(source)) => {
                    self.finished = true;
                    return Some(Err(ParseError::Csv {
                        path: self.path.clone(),
                        source,
                    }));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            };

            let value = record.get(self.column_index).unwrap_or_default();
            match Identifier::new(value) {
                Ok(identifier) => return Some(Ok(identifier)),
                Err(_) => {
                    let line = record.position().map(|p| p.line());
                    warn!(?line, "Skipping row with blank identifier");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_source(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("source.csv");
        std::fs::write(&path, contents).expect("Failed to write source file");
        path
    }

    fn collect(identifiers: Identifiers) -> Vec<String> {
        identifiers
            .map(|id| id.unwrap().as_str().to_string())
            .collect()
    }

    #[test]
    fn test_extracts_designated_column_in_order() {
        let dir = tempdir().unwrap();
        let path = write_source(
            dir.path(),
            "Customer,Base Document Reference,Amount\nacme,A100,1\nglobex,A101,2\nacme,A100,3\n",
        );

        let extractor = RecordExtractor::new(&CreatorConfig::default());
        let ids = collect(extractor.extract(&path).unwrap());
        assert_eq!(ids, vec!["A100", "A101", "A100"]);
    }

    #[test]
    fn test_first_data_row_is_not_skipped() {
        let dir = tempdir().unwrap();
        let path = write_source(dir.path(), "Base Document Reference\nA100\n");

        let extractor = RecordExtractor::new(&CreatorConfig::default());
        assert_eq!(collect(extractor.extract(&path).unwrap()), vec!["A100"]);
    }

    #[test]
    fn test_blank_cells_are_skipped() {
        let dir = tempdir().unwrap();
        let path = write_source(
            dir.path(),
            "Base Document Reference,Other\nA100,x\n,y\n   ,z\nA102,w\n",
        );

        let extractor = RecordExtractor::new(&CreatorConfig::default());
        assert_eq!(collect(extractor.extract(&path).unwrap()), vec!["A100", "A102"]);
    }

    #[test]
    fn test_header_with_bom_and_padding_matches() {
        let dir = tempdir().unwrap();
        let path = write_source(dir.path(), "\u{feff} Base Document Reference \nA100\n");

        let extractor = RecordExtractor::new(&CreatorConfig::default());
        assert_eq!(collect(extractor.extract(&path).unwrap()), vec!["A100"]);
    }

    #[test]
    fn test_custom_column_and_delimiter() {
        let dir = tempdir().unwrap();
        let path = write_source(dir.path(), "Job;Ref\nJ1;R-1\nJ2;R-2\n");

        let config = CreatorConfig::default().with_column("Ref").with_delimiter(b';');
        let extractor = RecordExtractor::new(&config);
        assert_eq!(collect(extractor.extract(&path).unwrap()), vec!["R-1", "R-2"]);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = tempdir().unwrap();
        let path = write_source(dir.path(), "Something Else\nA100\n");

        let extractor = RecordExtractor::new(&CreatorConfig::default());
        let err = extractor.extract(&path).err().unwrap();
        assert!(matches!(
            err,
            ParseError::MissingColumn { ref column, .. } if column == "Base Document Reference"
        ));
    }

    #[test]
    fn test_missing_file_is_an_open_error() {
        let dir = tempdir().unwrap();
        let extractor = RecordExtractor::new(&CreatorConfig::default());
        let err = extractor.extract(&dir.path().join("missing.csv")).err().unwrap();
        assert!(matches!(err, ParseError::Open { .. }));
    }

    #[test]
    fn test_malformed_row_ends_the_sequence() {
        let dir = tempdir().unwrap();
        let path = write_source(
            dir.path(),
            "Base Document Reference,Other\nA100,x\nA101,y,unexpected\nA102,z\n",
        );

        let extractor = RecordExtractor::new(&CreatorConfig::default());
        let mut ids = extractor.extract(&path).unwrap();
        assert_eq!(ids.next().unwrap().unwrap().as_str(), "A100");
        assert!(matches!(ids.next(), Some(Err(ParseError::Csv { .. }))));
        assert!(ids.next().is_none());
    }

    #[test]
    fn test_empty_file_has_no_column() {
        let dir = tempdir().unwrap();
        let path = write_source(dir.path(), "");

        let extractor = RecordExtractor::new(&CreatorConfig::default());
        assert!(matches!(
            extractor.extract(&path),
            Err(ParseError::MissingColumn { .. })
        ));
    }
}
