use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::config::CreatorConfig;
use crate::extract::{ParseError, RecordExtractor};
use crate::identifier::Identifier;
use crate::materialize::{BatchResult, MaterializeError, Materializer, Plan};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to find file {0}.")]
    SourceNotFound(PathBuf),

    #[error("Unable to find directory {0}.")]
    DestinationNotFound(PathBuf),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error("Reading the source file did not complete")]
    ExtractionTask(#[from] tokio::task::JoinError),
}

impl Error {
    /// True for the pre-check failures on either input path.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::SourceNotFound(_)
                | Error::DestinationNotFound(_)
                | Error::Materialize(MaterializeError::DirectoryNotFound(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Runs the whole batch: pre-checks, extraction, then folder creation.
///
/// Holds no state between invocations besides its configuration.
#[derive(Debug, Clone)]
pub struct FolderCreator {
    extractor: RecordExtractor,
    materializer: Materializer,
}

impl Default for FolderCreator {
    fn default() -> Self {
        FolderCreator::new(&CreatorConfig::default())
    }
}

impl FolderCreator {
    pub fn new(config: &CreatorConfig) -> Self {
        FolderCreator {
            extractor: RecordExtractor::new(config),
            materializer: Materializer::new(config),
        }
    }

    /// Creates one folder under `destination` for every identifier in `source`.
    ///
    /// # Errors
    ///
    /// Fails without creating anything if `source` is not an existing file,
    /// `destination` is not an existing directory, or `source` cannot be
    /// parsed. Failures of individual folders are reported in the
    /// [`BatchResult`] instead.
    #[instrument(
        skip(self),
        fields(source = %source.display(), destination = %destination.display())
    )]
    pub async fn create_folders(&self, source: &Path, destination: &Path) -> Result<BatchResult> {
        let identifiers = self.prepare(source, destination).await?;
        let result = self.materializer.materialize(identifiers, destination).await?;
        info!(success = result.is_success(), "Folder creation finished");
        Ok(result)
    }

    /// Same pre-checks and extraction as [`FolderCreator::create_folders`],
    /// but only reports which folders would be created.
    #[instrument(
        skip(self),
        fields(source = %source.display(), destination = %destination.display())
    )]
    pub async fn plan(&self, source: &Path, destination: &Path) -> Result<Plan> {
        let identifiers = self.prepare(source, destination).await?;
        Ok(self.materializer.plan(identifiers, destination).await?)
    }

    async fn prepare(&self, source: &Path, destination: &Path) -> Result<Vec<Identifier>> {
        if !is_file(source).await {
            return Err(Error::SourceNotFound(source.to_path_buf()));
        }
        if !is_dir(destination).await {
            return Err(Error::DestinationNotFound(destination.to_path_buf()));
        }
        self.read_identifiers(source).await
    }

    /// Drains the extractor on the blocking pool. The first parse error wins.
    async fn read_identifiers(&self, source: &Path) -> Result<Vec<Identifier>> {
        let extractor = self.extractor.clone();
        let source = source.to_path_buf();
        let identifiers = tokio::task::spawn_blocking(
            move || -> std::result::Result<Vec<Identifier>, ParseError> {
                extractor.extract(&source)?.collect()
            },
        )
        .await??;
        debug!(count = identifiers.len(), "Read identifiers");
        Ok(identifiers)
    }
}

/// Runs a batch with the default configuration.
pub async fn create_folders(source: &Path, destination: &Path) -> Result<BatchResult> {
    FolderCreator::default().create_folders(source, destination).await
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}
