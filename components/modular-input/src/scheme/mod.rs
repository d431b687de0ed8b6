//! Introspection model: what a modular input type accepts as configuration.

/// Scheme arguments.
pub mod argument;
/// The scheme document.
pub mod scheme;

pub use argument::{Argument, DataType};
pub use scheme::{Scheme, StreamingMode};
