//! Error types for the modular input engine.
//!
//! Every variant is caught at the mode-dispatch boundary in
//! [`crate::script::script::Script`] and turned into the artifact defined for
//! that mode plus exit status `1`. Only sink failures while writing those
//! artifacts reach the caller.

use thiserror::Error;

/// Modular input engine errors.
#[derive(Debug, Error)]
pub enum ModularInputError {
    /// The scheme hook returned no scheme.
    #[error("Modular input script returned a null scheme.")]
    NullScheme,

    /// The scheme cannot be advertised (empty title, duplicate argument names).
    #[error("invalid scheme: {0}")]
    InvalidScheme(String),

    /// The validation hook rejected the input definition.
    #[error("{0}")]
    ValidationFailure(String),

    /// Input XML is malformed, empty, or not UTF-8.
    #[error("failed to parse input XML: {0}")]
    Parse(String),

    /// The event-production hook failed.
    #[error("streaming events failed: {0:#}")]
    Streaming(anyhow::Error),

    /// An event was rejected before being written.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Output or error sink unavailable.
    #[error("failed to write to sink: {0}")]
    Write(#[from] std::io::Error),
}

/// Result type for modular input operations.
pub type Result<T> = std::result::Result<T, ModularInputError>;

impl ModularInputError {
    /// Build a [`ModularInputError::Parse`] from any displayable cause.
    pub(crate) fn parse(cause: impl std::fmt::Display) -> Self {
        Self::Parse(cause.to_string())
    }
}
