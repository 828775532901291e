use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::identifier::{Identifier, InvalidIdentifier};

/// Summary line used when every identifier ended up with a folder.
pub const SUCCESS_MESSAGE: &str = "All folders created successfully.";

/// Why a single folder could not be created. Never aborts sibling work.
#[derive(Debug, Error)]
pub enum CreationError {
    #[error("{0}")]
    InvalidName(#[from] InvalidIdentifier),

    #[error("{source}")]
    Io {
        kind: io::ErrorKind,
        #[source]
        source: io::Error,
    },

    #[error("a non-directory entry already exists at {0}")]
    NotADirectory(PathBuf),

    #[error("creation task did not complete: {0}")]
    TaskFailed(String),
}

impl CreationError {
    /// Short category name used in failure reports.
    pub fn category(&self) -> String {
        match self {
            CreationError::InvalidName(_) => "InvalidName".to_string(),
            CreationError::Io { kind, .. } => format!("{kind:?}"),
            CreationError::NotADirectory(_) => "NotADirectory".to_string(),
            CreationError::TaskFailed(_) => "TaskFailed".to_string(),
        }
    }
}

impl From<io::Error> for CreationError {
    fn from(source: io::Error) -> Self {
        CreationError::Io {
            kind: source.kind(),
            source,
        }
    }
}

/// Result of handling one identifier.
#[derive(Debug)]
pub enum CreationOutcome {
    Created,
    AlreadyExisted,
    Failed(CreationError),
}

impl CreationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CreationOutcome::Failed(_))
    }
}

/// One identifier together with what happened to it.
#[derive(Debug)]
pub struct EntryOutcome {
    pub identifier: Identifier,
    pub outcome: CreationOutcome,
}

/// Aggregate over all outcomes of one batch, in source order.
#[derive(Debug, Default)]
pub struct BatchResult {
    entries: Vec<EntryOutcome>,
}

impl BatchResult {
    pub fn new(entries: Vec<EntryOutcome>) -> Self {
        BatchResult { entries }
    }

    pub fn entries(&self) -> &[EntryOutcome] {
        &self.entries
    }

    /// True iff no identifier failed.
    pub fn is_success(&self) -> bool {
        !self.entries.iter().any(|e| e.outcome.is_failure())
    }

    pub fn created(&self) -> impl Iterator<Item = &Identifier> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, CreationOutcome::Created))
            .map(|e| &e.identifier)
    }

    pub fn already_existed(&self) -> impl Iterator<Item = &Identifier> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, CreationOutcome::AlreadyExisted))
            .map(|e| &e.identifier)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Identifier, &CreationError)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            CreationOutcome::Failed(err) => Some((&e.identifier, err)),
            _ => None,
        })
    }

    /// One `identifier: category: message` line per failed identifier.
    pub fn failure_lines(&self) -> Vec<String> {
        self.failures()
            .map(|(id, err)| format!("{}: {}: {}", id, err.category(), err))
            .collect()
    }

    /// The success line, or the failure lines joined by newlines.
    pub fn message(&self) -> String {
        if self.is_success() {
            SUCCESS_MESSAGE.to_string()
        } else {
            self.failure_lines().join("\n")
        }
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            success: self.is_success(),
            created: self.created().cloned().collect(),
            already_existed: self.already_existed().cloned().collect(),
            failures: self
                .failures()
                .map(|(id, err)| FailureRecord {
                    identifier: id.clone(),
                    category: err.category(),
                    message: err.to_string(),
                })
                .collect(),
        }
    }
}

/// Serializable view of a [`BatchResult`].
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub success: bool,
    pub created: Vec<Identifier>,
    pub already_existed: Vec<Identifier>,
    pub failures: Vec<FailureRecord>,
}

#[derive(Debug, Serialize)]
pub struct FailureRecord {
    pub identifier: Identifier,
    pub category: String,
    pub message: String,
}
