// External crates
use std::fmt;

/// Selects [`Mode::Scheme`].
pub const SCHEME_FLAG: &str = "--scheme";
/// Selects [`Mode::ValidateArguments`].
pub const VALIDATE_ARGUMENTS_FLAG: &str = "--validate-arguments";

/// The three mutually exclusive ways the orchestrator invokes a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `--scheme`: print the introspection document.
    Scheme,
    /// `--validate-arguments`: validate one configuration read from stdin.
    ValidateArguments,
    /// No flag: read the input definition and stream events.
    StreamEvents,
}

impl Mode {
    /// Select the mode from a process argument list.
    ///
    /// `args[0]` is the script path and is never interpreted. The first
    /// recognized flag after it wins; anything unrecognized is ignored.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        args.iter()
            .skip(1)
            .find_map(|arg| match arg.as_ref() {
                SCHEME_FLAG => Some(Mode::Scheme),
                VALIDATE_ARGUMENTS_FLAG => Some(Mode::ValidateArguments),
                other => {
                    tracing::debug!(argument = other, "Ignoring unrecognized argument");
                    None
                }
            })
            .unwrap_or(Mode::StreamEvents)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Scheme => "scheme",
            Mode::ValidateArguments => "validate-arguments",
            Mode::StreamEvents => "stream-events",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/opt/bin/input";

    #[test]
    fn no_flag_selects_streaming() {
        assert_eq!(Mode::from_args(&[PATH]), Mode::StreamEvents);
        assert_eq!(Mode::from_args::<&str>(&[]), Mode::StreamEvents);
    }

    #[test]
    fn recognized_flags_select_their_mode() {
        assert_eq!(Mode::from_args(&[PATH, "--scheme"]), Mode::Scheme);
        assert_eq!(
            Mode::from_args(&[PATH, "--validate-arguments"]),
            Mode::ValidateArguments
        );
    }

    #[test]
    fn first_recognized_flag_wins() {
        assert_eq!(
            Mode::from_args(&[PATH, "--validate-arguments", "--scheme"]),
            Mode::ValidateArguments
        );
        assert_eq!(
            Mode::from_args(&[PATH, "--verbose", "--scheme", "--validate-arguments"]),
            Mode::Scheme
        );
    }

    #[test]
    fn script_path_is_never_a_flag() {
        assert_eq!(Mode::from_args(&["--scheme"]), Mode::StreamEvents);
    }
}
