//! Error types for the hamlet core library.

use thiserror::Error;

/// Top-level error type for all core operations.
#[derive(Error, Debug)]
pub enum HamletError {
    /// Eviction was requested from a stream that holds no records.
    ///
    /// Capacity is never below one, so the automatic eviction path cannot
    /// reach this; seeing it means a programming error.
    #[error("Capacity invariant violated: cannot evict from an empty memory stream")]
    CapacityInvariant,

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, HamletError>;
