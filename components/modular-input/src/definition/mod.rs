//! Configuration handed to the script by the orchestrator on standard input.

/// Definition data types.
pub mod models;
/// XML parsers for both definition documents.
pub mod parser;

pub use models::{InputDefinition, Metadata, ParamValue, Parameters, ValidationDefinition};
