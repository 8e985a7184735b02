//! Error types for the outcome engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A step of applying a consequence through the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Creating new items.
    Create,
    /// Updating existing items.
    Update,
    /// Deleting items.
    Delete,
    /// Updating the actor (known formulas).
    Actor,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Actor => write!(f, "actor update"),
        }
    }
}

/// A rejection reported by an external collaborator (catalog or persistence).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

/// Errors that can occur while resolving an outcome.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The DC table or a required setting is missing or invalid.
    /// Aborts the attempt before any mutation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No substitute item could be found for a deceptive replacement.
    #[error("no replacement available: {0}")]
    NoReplacementAvailable(String),

    /// A persistence call rejected. Earlier stages stay applied.
    #[error("persistence failed during {stage}: {message}")]
    Persistence {
        /// The stage that failed.
        stage: Stage,
        /// The collaborator's message.
        message: String,
    },

    /// The caller supplied input the engine cannot resolve.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An item index search or definition fetch rejected.
    #[error("catalog error: {0}")]
    Catalog(#[from] CollaboratorError),

    /// A core view-model could not be built.
    #[error(transparent)]
    Core(#[from] wb_core::CoreError),
}

/// Convenience result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
