//! Turns identifiers into child folders of a destination root.
//!
//! Work happens in two phases. [`Materializer::plan`] checks every identifier
//! against the destination in order: names that would not be a direct child
//! are rejected, repeats of an earlier identifier are not scheduled again,
//! and identifiers whose folder exists are left alone. The remaining
//! identifiers are then created by [`Materializer::materialize`], each on its
//! own task on the tokio runtime, with at most `max_in_flight` creations
//! running at once. A repeated identifier is reported as already existing
//! only when its first occurrence left a folder behind; repeats of a failed
//! identifier are left out of the result so each failure appears once.
//!
//! A failed creation never cancels its siblings. Existing entries are never
//! modified or removed. Losing a creation race to another writer counts as
//! "already existed" when the winner left a directory behind.

pub use self::outcome::{
    BatchResult, BatchSummary, CreationError, CreationOutcome, EntryOutcome, FailureRecord,
    SUCCESS_MESSAGE,
};

mod outcome;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::config::CreatorConfig;
use crate::identifier::{Identifier, InvalidIdentifier};

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Unable to find directory {0}.")]
    DirectoryNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

/// What the plan decided for one identifier.
#[derive(Debug)]
pub enum PlanStep {
    Create,
    Existing,
    /// Same name as an earlier identifier in the batch.
    Duplicate,
    Reject(InvalidIdentifier),
}

#[derive(Debug)]
pub struct PlannedEntry {
    pub identifier: Identifier,
    pub step: PlanStep,
}

/// Per-identifier decisions for one destination, in input order.
#[derive(Debug)]
pub struct Plan {
    root: PathBuf,
    entries: Vec<PlannedEntry>,
}

impl Plan {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[PlannedEntry] {
        &self.entries
    }

    /// Identifiers that still need a folder.
    pub fn to_create(&self) -> impl Iterator<Item = &Identifier> {
        self.entries
            .iter()
            .filter(|e| matches!(e.step, PlanStep::Create))
            .map(|e| &e.identifier)
    }
}

/// Creates missing folders under a destination root.
#[derive(Debug, Clone)]
pub struct Materializer {
    max_in_flight: usize,
}

impl Materializer {
    pub fn new(config: &CreatorConfig) -> Self {
        Materializer {
            max_in_flight: config.max_in_flight.max(1),
        }
    }

    /// Decides which identifiers need a folder without touching the filesystem
    /// beyond existence checks.
    ///
    /// # Errors
    ///
    /// Returns [`MaterializeError::DirectoryNotFound`] or
    /// [`MaterializeError::NotADirectory`] before consuming `identifiers` when
    /// `root` is not an existing directory.
    #[instrument(skip(self, identifiers), fields(root = %root.display()))]
    pub async fn plan<I>(&self, identifiers: I, root: &Path) -> Result<Plan, MaterializeError>
    where
        I: IntoIterator<Item = Identifier>,
    {
        check_root(root).await?;

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for identifier in identifiers {
            let step = if !seen.insert(identifier.clone()) {
                PlanStep::Duplicate
            } else if let Err(e) = identifier.validate_folder_name() {
                PlanStep::Reject(e)
            } else if is_dir(&root.join(identifier.as_str())).await {
                PlanStep::Existing
            } else {
                PlanStep::Create
            };
            entries.push(PlannedEntry { identifier, step });
        }

        debug!(
            total = entries.len(),
            to_create = entries
                .iter()
                .filter(|e| matches!(e.step, PlanStep::Create))
                .count(),
            "Planned batch"
        );
        Ok(Plan {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// Creates a folder for every identifier that lacks one and reports the
    /// outcome of each identifier in input order.
    ///
    /// # Errors
    ///
    /// Only a missing or invalid `root` is an error. Per-identifier failures
    /// are collected in the returned [`BatchResult`].
    #[instrument(skip(self, identifiers), fields(root = %root.display()))]
    pub async fn materialize<I>(
        &self,
        identifiers: I,
        root: &Path,
    ) -> Result<BatchResult, MaterializeError>
    where
        I: IntoIterator<Item = Identifier>,
    {
        let plan = self.plan(identifiers, root).await?;
        Ok(self.execute(plan).await)
    }

    /// Runs the creations a plan calls for.
    pub async fn execute(&self, plan: Plan) -> BatchResult {
        let Plan { root, entries } = plan;

        let pending: Vec<PathBuf> = entries
            .iter()
            .filter(|e| matches!(e.step, PlanStep::Create))
            .map(|e| root.join(e.identifier.as_str()))
            .collect();

        // `buffered` keeps results in input order while bounding in-flight work.
        let mut created = stream::iter(pending)
            .map(|path| async move {
                match tokio::spawn(create_folder(path)).await {
                    Ok(outcome) => outcome,
                    Err(e) => CreationOutcome::Failed(CreationError::TaskFailed(e.to_string())),
                }
            })
            .buffered(self.max_in_flight)
            .collect::<Vec<_>>()
            .await
            .into_iter();

        // A repeat always follows its first occurrence, so `failed` is
        // complete for an identifier by the time a repeat is reached.
        let mut failed = HashSet::new();
        let mut results = Vec::with_capacity(entries.len());
        for PlannedEntry { identifier, step } in entries {
            let outcome = match step {
                PlanStep::Create => created.next().unwrap_or_else(|| {
                    CreationOutcome::Failed(CreationError::TaskFailed(
                        "no result was produced".to_string(),
                    ))
                }),
                PlanStep::Existing => CreationOutcome::AlreadyExisted,
                // The first occurrence already carries the failure line.
                PlanStep::Duplicate if failed.contains(&identifier) => continue,
                PlanStep::Duplicate => CreationOutcome::AlreadyExisted,
                PlanStep::Reject(e) => CreationOutcome::Failed(CreationError::InvalidName(e)),
            };
            if let CreationOutcome::Failed(err) = &outcome {
                warn!(%identifier, category = %err.category(), "Folder creation failed: {}", err);
                failed.insert(identifier.clone());
            }
            results.push(EntryOutcome { identifier, outcome });
        }

        let result = BatchResult::new(results);
        info!(
            created = result.created().count(),
            already_existed = result.already_existed().count(),
            failed = result.failures().count(),
            "Batch finished"
        );
        result
    }
}

async fn check_root(root: &Path) -> Result<(), MaterializeError> {
    let meta = fs::metadata(root).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MaterializeError::DirectoryNotFound(root.to_path_buf())
        } else {
            MaterializeError::Io(e)
        }
    })?;
    if !meta.is_dir() {
        return Err(MaterializeError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn create_folder(path: PathBuf) -> CreationOutcome {
    match fs::create_dir(&path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Created folder");
            CreationOutcome::Created
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            if is_dir(&path).await {
                debug!(path = %path.display(), "Folder appeared concurrently");
                CreationOutcome::AlreadyExisted
            } else {
                CreationOutcome::Failed(CreationError::NotADirectory(path))
            }
        }
        Err(e) => CreationOutcome::Failed(CreationError::from(e)),
    }
}
