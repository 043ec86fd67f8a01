//! Error types for answer keys and task trackers.
//!
//! `KeyError` covers answer-key defects that are rejected at construction
//! time. `TrackerError` covers failures talking to the task-tracking service.

use thiserror::Error;

/// A defect in an answer key that makes it unusable for grading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KeyError {
    /// Two questions share the same identifier.
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),

    /// A question has an empty identifier.
    #[error("question #{0} has an empty id")]
    EmptyQuestionId(usize),

    /// An exact or substring answer is blank.
    #[error("question '{0}': expected answer is empty")]
    EmptyExpected(String),

    /// A multi-choice answer has no expected options.
    #[error("question '{0}': multi-choice answer has no expected options")]
    EmptyChoiceSet(String),

    /// A concept question has no concept groups.
    #[error("question '{0}': concept answer has no groups")]
    NoConceptGroups(String),

    /// A concept group has no synonyms.
    #[error("question '{question}': concept group #{group} is empty")]
    EmptyConceptGroup { question: String, group: usize },

    /// A synonym is blank.
    #[error("question '{question}': concept group #{group} contains a blank synonym")]
    BlankSynonym { question: String, group: usize },

    /// The approval threshold is not a ratio.
    #[error("approval threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f64),
}

/// Errors that can occur when interacting with a task tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid or expired token).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The token is valid but lacks access to the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested project, section, or task does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl TrackerError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            TrackerError::AuthenticationFailed(_)
                | TrackerError::Forbidden(_)
                | TrackerError::NotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            TrackerError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
