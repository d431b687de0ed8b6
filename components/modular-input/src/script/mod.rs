//! Mode dispatch and the hook interface script authors implement.

/// Invocation mode selection.
pub mod mode;
/// The script controller and hook trait.
pub mod script;

pub use mode::Mode;
pub use script::{
    ExitStatus, ModularInput, Script, ScriptCompletion, ScriptState, Validation,
    ValidationFailure,
};
