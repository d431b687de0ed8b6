//! Modular Input Script protocol engine.
//!
//! Turns a data-collection routine into an external program the VES
//! orchestrator can introspect (`--scheme`), validate
//! (`--validate-arguments`) and run repeatedly to stream events.
//!
//! Implement [`ModularInput`] and hand it to [`Script`]:
//!
//! ```no_run
//! use modular_input::{
//!     Event, EventWriter, InputDefinition, ModularInput, Scheme, Script, Validation,
//!     ValidationDefinition,
//! };
//! use std::io::Write;
//!
//! struct Heartbeat;
//!
//! impl ModularInput for Heartbeat {
//!     fn scheme(&self) -> Option<Scheme> {
//!         Some(Scheme::new("heartbeat"))
//!     }
//!
//!     fn validate_input(&self, _definition: &ValidationDefinition) -> Validation {
//!         Ok(())
//!     }
//!
//!     fn stream_events<W: Write, E: Write>(
//!         &mut self,
//!         inputs: &InputDefinition,
//!         event_writer: &mut EventWriter<W, E>,
//!     ) -> anyhow::Result<()> {
//!         for stanza in inputs.inputs.keys() {
//!             event_writer.write_event(&Event::new("alive").with_stanza(stanza.as_str()))?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     Script::new(Heartbeat).run()
//! }
//! ```

/// Input and validation definitions read from standard input.
pub mod definition;
/// Engine error type.
pub mod error;
/// Event stream output and protocol log lines.
pub mod event_writer;
/// Configuration loading and XML plumbing.
pub mod helpers;
/// Diagnostic tracing setup.
pub mod instrumentation;
/// The `ves-log-input` reference modular input.
pub mod log_input;
/// Introspection scheme model and serialization.
pub mod scheme;
/// Mode dispatch and the script author hooks.
pub mod script;

pub use definition::{InputDefinition, Metadata, ParamValue, Parameters, ValidationDefinition};
pub use error::{ModularInputError, Result};
pub use event_writer::{Event, EventWriter, Severity};
pub use helpers::xml::{XmlNode, structurally_equal};
pub use scheme::{Argument, DataType, Scheme, StreamingMode};
pub use script::{
    ExitStatus, Mode, ModularInput, Script, ScriptCompletion, ScriptState, Validation,
    ValidationFailure,
};
