//! Error types for vocab-core.
//!
//! Scheduling itself never fails; these cover the local store and the
//! local-mode trainer operations that sit on top of it.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the local store and trainer engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("email {0} is already registered")]
    DuplicateEmail(String),

    #[error("admin role required")]
    Forbidden,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("card {0} is not due for review")]
    NotDue(Uuid),
}

impl CoreError {
    pub(crate) fn card_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "card", id }
    }

    pub(crate) fn user_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "user", id }
    }

    pub(crate) fn set_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "set", id }
    }
}
