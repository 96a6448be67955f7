//! Error types shared across the workspace.

use std::io;

use thiserror::Error;

use crate::gate::PhaseId;

/// Errors raised by workspace operations.
///
/// The domain variants (`Validation`, `NotFound`, `GateNotSatisfied`,
/// `SyncFailure`) are all recoverable: the caller re-renders the current
/// state and surfaces the condition to the operator.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// A state document or request was malformed. Nothing was mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced beat, version, donor option or task does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Forward phase transition attempted while the phase predicate is false.
    #[error("Gate not satisfied for phase '{phase}'")]
    GateNotSatisfied { phase: PhaseId },

    /// A call to an external collaborator (store or generator) failed.
    #[error("Sync failure: {0}")]
    SyncFailure(String),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl WorkspaceError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether this error reflects operator input rather than a system fault.
    pub fn is_operator_error(&self) -> bool {
        matches!(
            self,
            WorkspaceError::Validation(_)
                | WorkspaceError::NotFound { .. }
                | WorkspaceError::GateNotSatisfied { .. }
        )
    }
}

/// Result type for workspace operations.
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
