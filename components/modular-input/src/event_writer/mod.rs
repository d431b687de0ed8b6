//! Event serialization and protocol logging.

/// Event records and log severities.
pub mod event;
/// The writer owning the output and error sinks.
pub mod event_writer;

pub use event::{Event, Severity};
pub use event_writer::EventWriter;
