//! Session error types.

use snapclean_models::{ModelError, ProcessingStage};
use thiserror::Error;

use crate::backend::BackendError;

pub type SessionResult<T> = Result<T, SessionError>;

/// Kind of network request a session issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Detection,
    Removal,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Detection => "detection",
            RequestKind::Removal => "removal",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ModelError),

    #[error("Please select at least one person to remove")]
    NothingSelected,

    #[error("No detected person with id {0}")]
    UnknownPerson(String),

    #[error("A {0} request is already in progress")]
    RequestInFlight(RequestKind),

    #[error("No {0} request is pending")]
    NoPendingRequest(RequestKind),

    #[error("Response belongs to a previous session")]
    StaleResponse,

    #[error("Cannot {action} during the {stage} stage")]
    InvalidTransition {
        action: &'static str,
        stage: ProcessingStage,
    },

    #[error("{0}")]
    Backend(#[from] BackendError),
}

impl SessionError {
    /// Guard violations are reported to the user without any request being sent.
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            SessionError::NothingSelected
                | SessionError::RequestInFlight(_)
                | SessionError::InvalidTransition { .. }
                | SessionError::UnknownPerson(_)
                | SessionError::InvalidImage(_)
        )
    }
}
