//! Remembers the last destination directory between runs.
//!
//! The store is a single-line plain text file. Loading returns the first line;
//! saving replaces the whole file with one line.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Unable to read remembered destination from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to save remembered destination to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Default file name of the store, relative to the working directory.
pub const DEFAULT_STORE_FILE: &str = "destination.txt";

#[derive(Debug, Clone)]
pub struct DestinationStore {
    path: PathBuf,
}

impl DestinationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DestinationStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the remembered destination, or an empty string if the file is
    /// absent or cannot be read.
    pub async fn load(&self) -> String {
        match self.try_load().await {
            Ok(value) => value,
            Err(e) => {
                warn!("{}", e);
                String::new()
            }
        }
    }

    /// Like [`DestinationStore::load`], but reports read failures other than
    /// a missing file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn try_load(&self) -> Result<String, PersistenceError> {
        let file = match fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No remembered destination");
                return Ok(String::new());
            }
            Err(source) => {
                return Err(PersistenceError::Load {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut line = String::new();
        BufReader::new(file)
            .read_line(&mut line)
            .await
            .map_err(|source| PersistenceError::Load {
                path: self.path.clone(),
                source,
            })?;

        let value = line.trim_end_matches(['\r', '\n']).to_string();
        debug!(destination = %value, "Loaded remembered destination");
        Ok(value)
    }

    /// Overwrites the store with `value` followed by a newline.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn save(&self, value: &str) -> Result<(), PersistenceError> {
        fs::write(&self.path, format!("{value}\n"))
            .await
            .map_err(|source| PersistenceError::Save {
                path: self.path.clone(),
                source,
            })?;
        debug!("Saved remembered destination");
        Ok(())
    }
}

impl Default for DestinationStore {
    fn default() -> Self {
        DestinationStore::new(DEFAULT_STORE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = DestinationStore::new(dir.path().join("destination.txt"));
        assert_eq!(store.try_load().await.unwrap(), "");
        assert_eq!(store.load().await, "");
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = DestinationStore::new(dir.path().join("destination.txt"));

        store.save("/srv/jobs").await.unwrap();
        assert_eq!(store.load().await, "/srv/jobs");
        let raw = fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(raw, "/srv/jobs\n");
    }

    #[tokio::test]
    async fn test_save_replaces_longer_value() {
        let dir = tempdir().unwrap();
        let store = DestinationStore::new(dir.path().join("destination.txt"));

        store.save("/a/very/long/destination/path").await.unwrap();
        store.save("/short").await.unwrap();
        assert_eq!(fs::read_to_string(store.path()).await.unwrap(), "/short\n");
    }

    #[tokio::test]
    async fn test_only_first_line_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("destination.txt");
        fs::write(&path, "C:\\Jobs\r\nsecond line\n").await.unwrap();

        let store = DestinationStore::new(path);
        assert_eq!(store.load().await, "C:\\Jobs");
    }

    #[tokio::test]
    async fn test_unreadable_store_reports_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be read as a file.
        let store = DestinationStore::new(dir.path());
        assert!(matches!(store.try_load().await, Err(PersistenceError::Load { .. })));
        assert_eq!(store.load().await, "");
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let store = DestinationStore::new(dir.path().join("missing").join("destination.txt"));
        assert!(matches!(store.save("/x").await, Err(PersistenceError::Save { .. })));
    }
}
