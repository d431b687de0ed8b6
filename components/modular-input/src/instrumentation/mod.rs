//! Diagnostic tracing for the script process.

/// Subscriber and panic hook installation.
pub mod tracing;
