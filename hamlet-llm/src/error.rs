//! Generation error types.

use thiserror::Error;

/// Errors that can occur while asking the service for text.
///
/// None of these should ever end a turn: the orchestrator converts them
/// into degraded content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The request did not finish within the configured timeout.
    #[error("generation timed out after {secs}s")]
    Timeout {
        /// Timeout that elapsed.
        secs: u64,
    },

    /// Connection or protocol failure.
    #[error("generation request failed: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("generation service returned HTTP {code}: {body}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response did not have the expected shape.
    #[error("malformed generation response: {0}")]
    Malformed(String),

    /// No service is configured or reachable.
    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    /// Every attempt failed.
    #[error("all {attempts} generation attempts failed: {last_error}")]
    RetriesExhausted {
        /// Attempts made, first one included.
        attempts: u32,
        /// Message of the final failure.
        last_error: String,
    },

    /// A scripted generator ran out of replies.
    #[error("scripted generator has no replies left")]
    Exhausted,
}

impl GenerationError {
    /// Map a `reqwest` failure, keeping the timeout that was in force.
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { secs: timeout_secs }
        } else if err.is_connect() {
            Self::Unavailable(err.to_string())
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, GenerationError>;
