// Local crates
use crate::{
    definition::models::{InputDefinition, ValidationDefinition},
    error::{ModularInputError, Result},
    event_writer::{event::Severity, event_writer::EventWriter},
    helpers::xml::{write_event, write_text_element},
    scheme::scheme::Scheme,
    script::mode::Mode,
};

// External crates
use quick_xml::{
    Writer,
    events::{BytesEnd, BytesStart, Event},
};
use std::any::Any;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use tracing::instrument;

/// Rejection returned by [`ModularInput::validate_input`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationFailure {
    /// Human-readable reason shown to the user by the orchestrator.
    pub message: String,
}

impl ValidationFailure {
    /// Rejection carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ValidationFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Outcome of the validation hook: `Ok(())` accepts the configuration.
pub type Validation = std::result::Result<(), ValidationFailure>;

/// The data-collection routine a script author supplies.
///
/// [`Script`] drives these hooks according to the invocation mode. A hook
/// that panics is handled like one that returned an error.
pub trait ModularInput {
    /// Describe the input type. `None` is reported to the orchestrator as a
    /// fatal error.
    fn scheme(&self) -> Option<Scheme>;

    /// Accept or reject a configuration before the orchestrator saves it.
    fn validate_input(&self, definition: &ValidationDefinition) -> Validation;

    /// Emit zero or more events for the configured stanzas.
    fn stream_events<W: Write, E: Write>(
        &mut self,
        inputs: &InputDefinition,
        event_writer: &mut EventWriter<W, E>,
    ) -> anyhow::Result<()>;
}

/// Process exit status reported to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// Exit code `0`.
    Success,
    /// Exit code `1`.
    Failure,
}

impl ExitStatus {
    /// Numeric process exit code.
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::SUCCESS,
            ExitStatus::Failure => ExitCode::FAILURE,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Lifecycle of one script invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptState {
    /// No invocation has run yet.
    Uninitialized,
    /// Mode selected, hook in progress.
    Dispatched(Mode),
    /// Invocation finished with this status.
    Completed(ExitStatus),
}

/// What [`Script::run_script`] hands back: the exit status plus the failure
/// to report to the caller, if any.
///
/// A null scheme completes with [`ExitStatus::Failure`] but no error; its
/// whole report is the `FATAL` line on the error sink.
#[derive(Debug)]
pub struct ScriptCompletion {
    /// Exit status for the process.
    pub status: ExitStatus,
    /// Failure not already fully reported on the sinks.
    pub error: Option<ModularInputError>,
}

impl ScriptCompletion {
    fn success() -> Self {
        Self {
            status: ExitStatus::Success,
            error: None,
        }
    }

    fn failure(error: Option<ModularInputError>) -> Self {
        Self {
            status: ExitStatus::Failure,
            error,
        }
    }
}

/// Controller that turns a [`ModularInput`] into a conforming external
/// program: selects the mode from the arguments, reads any definition from
/// the input source, calls the matching hook and writes the mode's artifact.
#[derive(Debug)]
pub struct Script<M: ModularInput> {
    input: M,
    state: ScriptState,
}

impl<M: ModularInput> Script<M> {
    /// Wrap `input`; nothing runs until [`Script::run`] or [`Script::run_script`].
    pub fn new(input: M) -> Self {
        Self {
            input,
            state: ScriptState::Uninitialized,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScriptState {
        self.state
    }

    /// The wrapped modular input.
    pub fn input(&self) -> &M {
        &self.input
    }

    /// Run against the real process: arguments, stdin, stdout and stderr.
    pub fn run(&mut self) -> ExitCode {
        let args = lossy_args(std::env::args_os());
        let mut event_writer = EventWriter::stdio();
        let completion = self.run_script(&args, &mut event_writer, io::stdin().lock());

        if let Some(error) = &completion.error {
            tracing::error!(error = %error, status = %completion.status, "Modular input script failed");
        }
        completion.status.into()
    }

    /// Run one invocation against caller-supplied streams.
    ///
    /// `args[0]` is the script path. The input source is only read in
    /// validate-arguments and streaming modes.
    #[instrument(
        name = "modular_input_script::run_script",
        target = "script::script::Script",
        skip_all,
        level = "debug"
    )]
    pub fn run_script<S, W, E, R>(
        &mut self,
        args: &[S],
        event_writer: &mut EventWriter<W, E>,
        input: R,
    ) -> ScriptCompletion
    where
        S: AsRef<str>,
        W: Write,
        E: Write,
        R: Read,
    {
        let mode = Mode::from_args(args);
        self.state = ScriptState::Dispatched(mode);
        tracing::debug!(%mode, argument_count = args.len(), "Dispatching modular input script");

        let completion = match mode {
            Mode::Scheme => self.print_scheme(event_writer),
            Mode::ValidateArguments => self.validate_arguments(event_writer, input),
            Mode::StreamEvents => self.stream(event_writer, input),
        };

        self.state = ScriptState::Completed(completion.status);
        tracing::debug!(
            %mode,
            status = %completion.status,
            error = ?completion.error,
            "Modular input script completed"
        );
        completion
    }

    fn print_scheme<W: Write, E: Write>(
        &self,
        event_writer: &mut EventWriter<W, E>,
    ) -> ScriptCompletion {
        let scheme = match panic::catch_unwind(AssertUnwindSafe(|| self.input.scheme())) {
            Ok(scheme) => scheme,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(panic_message = %message, "Scheme hook panicked");
                let error = log_fatal(event_writer, &message)
                    .unwrap_or(ModularInputError::InvalidScheme(message));
                return ScriptCompletion::failure(Some(error));
            }
        };

        let Some(scheme) = scheme else {
            tracing::error!("Scheme hook returned no scheme");
            let error = log_fatal(event_writer, &ModularInputError::NullScheme.to_string());
            return ScriptCompletion::failure(error);
        };

        let written = scheme
            .to_xml()
            .and_then(|document| event_writer.write_xml_document(&document));

        match written {
            Ok(()) => ScriptCompletion::success(),
            Err(error) => {
                tracing::error!(error = %error, "Failed to advertise scheme");
                log_fatal(event_writer, &error.to_string());
                ScriptCompletion::failure(Some(error))
            }
        }
    }

    fn validate_arguments<W: Write, E: Write, R: Read>(
        &self,
        event_writer: &mut EventWriter<W, E>,
        input: R,
    ) -> ScriptCompletion {
        let outcome = read_input(input)
            .and_then(|document| ValidationDefinition::parse(&document))
            .and_then(|definition| {
                let hook = panic::catch_unwind(AssertUnwindSafe(|| {
                    self.input.validate_input(&definition)
                }));
                match hook {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(failure)) => Err(ModularInputError::ValidationFailure(failure.message)),
                    Err(payload) => Err(ModularInputError::ValidationFailure(panic_message(
                        payload.as_ref(),
                    ))),
                }
            });

        let error = match outcome {
            Ok(()) => return ScriptCompletion::success(),
            Err(error) => error,
        };

        tracing::warn!(error = %error, "Input definition failed validation");

        let message = match &error {
            ModularInputError::ValidationFailure(message) => message.clone(),
            other => other.to_string(),
        };
        if let Err(write_error) = error_document(&message)
            .and_then(|document| event_writer.write_xml_document(&document))
        {
            tracing::error!(error = %write_error, "Failed to write validation error document");
            return ScriptCompletion::failure(Some(write_error));
        }

        ScriptCompletion::failure(Some(error))
    }

    fn stream<W: Write, E: Write, R: Read>(
        &mut self,
        event_writer: &mut EventWriter<W, E>,
        input: R,
    ) -> ScriptCompletion {
        let definition = match read_input(input).and_then(|doc| InputDefinition::parse(&doc)) {
            Ok(definition) => definition,
            Err(error) => {
                tracing::error!(error = %error, "Failed to read input definition");
                return ScriptCompletion::failure(Some(log_error(event_writer, error)));
            }
        };

        let hook = panic::catch_unwind(AssertUnwindSafe(|| {
            self.input.stream_events(&definition, event_writer)
        }));
        let outcome = match hook {
            Ok(result) => result.map_err(ModularInputError::Streaming),
            Err(payload) => Err(ModularInputError::Streaming(anyhow::anyhow!(
                panic_message(payload.as_ref())
            ))),
        };

        if let Err(close_error) = event_writer.close() {
            tracing::error!(error = %close_error, "Failed to close event stream");
            return ScriptCompletion::failure(Some(close_error));
        }

        match outcome {
            Ok(()) => ScriptCompletion::success(),
            Err(error) => {
                tracing::error!(error = %error, "Event streaming hook failed");
                ScriptCompletion::failure(Some(log_error(event_writer, error)))
            }
        }
    }
}

/// Write the `FATAL` line; a failing error sink becomes the reported error.
fn log_fatal<W: Write, E: Write>(
    event_writer: &mut EventWriter<W, E>,
    message: &str,
) -> Option<ModularInputError> {
    event_writer.log(Severity::Fatal, message).err()
}

/// Write an `ERROR` line for `error`; a failing error sink takes precedence.
fn log_error<W: Write, E: Write>(
    event_writer: &mut EventWriter<W, E>,
    error: ModularInputError,
) -> ModularInputError {
    match event_writer.log(Severity::Error, &error.to_string()) {
        Ok(()) => error,
        Err(write_error) => write_error,
    }
}

/// Process arguments as strings; bytes that are not UTF-8 are replaced
/// rather than aborting the process.
fn lossy_args(args: impl IntoIterator<Item = OsString>) -> Vec<String> {
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

fn read_input<R: Read>(mut input: R) -> Result<String> {
    let mut document = String::new();
    input
        .read_to_string(&mut document)
        .map_err(|e| ModularInputError::parse(format!("failed to read input definition: {e}")))?;
    Ok(document)
}

/// `<error><message>...</message></error>`
pub fn error_document(message: &str) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_event(&mut writer, Event::Start(BytesStart::new("error")))?;
    write_text_element(&mut writer, "message", message)?;
    write_event(&mut writer, Event::End(BytesEnd::new("error")))?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| ModularInputError::Write(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "modular input hook panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_document_escapes_message() {
        assert_eq!(
            error_document("a < b & c").unwrap(),
            "<error><message>a &lt; b &amp; c</message></error>"
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_arguments_are_kept_lossily() {
        use std::os::unix::ffi::OsStringExt;

        let args = lossy_args([
            OsString::from_vec(b"/opt/in\xffput".to_vec()),
            OsString::from("--scheme"),
        ]);
        assert_eq!(args, ["/opt/in\u{FFFD}put", "--scheme"]);
        assert_eq!(Mode::from_args(&args), Mode::Scheme);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload = panic::catch_unwind(|| -> u8 { panic!("boom {}", 1) }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 1");

        let payload = panic::catch_unwind(|| -> u8 { panic!("static") }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
    }

    #[test]
    fn exit_status_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failure.code(), 1);
    }
}
