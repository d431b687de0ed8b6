//! Reference modular input built on the engine: ships new log file lines.

/// Data file discovery.
pub mod discovery;
/// The `ModularInput` implementation.
pub mod input;
/// Checkpoint persistence.
pub mod models;
/// Incremental line reading.
pub mod reader;

pub use input::LogFileInput;
