//! `ves-log-input`: a modular input that ships new lines from log files.
//!
//! Each stanza points at a file or directory. Every invocation reads the
//! lines appended since the previous run, optionally keeps only those
//! matching a regex, and emits one event per line. Read offsets live in the
//! orchestrator-provided checkpoint directory.

// Local crates
use crate::{
    definition::models::{InputDefinition, Parameters, ValidationDefinition},
    event_writer::{
        event::{Event, Severity},
        event_writer::EventWriter,
    },
    log_input::{discovery::discover_files, models::Checkpoint, reader::NewLines},
    scheme::{
        argument::{Argument, DataType},
        scheme::{Scheme, StreamingMode},
    },
    script::script::{ModularInput, Validation, ValidationFailure},
};

// External crates
use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use tracing::instrument;

/// Sourcetype stamped on events when a stanza sets none.
pub const DEFAULT_SOURCETYPE: &str = "ves:log";

/// File extensions read from a directory when a stanza sets none.
pub const DEFAULT_EXTENSIONS: &str = "log,txt";

/// The log file modular input.
#[derive(Debug, Default, Clone)]
pub struct LogFileInput;

impl ModularInput for LogFileInput {
    fn scheme(&self) -> Option<Scheme> {
        Some(
            Scheme::new("VES log files")
                .with_description("Ship new lines from local log files as events.")
                .use_external_validation(true)
                .use_single_instance(false)
                .with_streaming_mode(StreamingMode::Xml)
                .with_argument(
                    Argument::new("path")
                        .with_title("Path")
                        .with_description("Log file, or directory holding data files.")
                        .required_on_create(true),
                )
                .with_argument(
                    Argument::new("recursive")
                        .with_title("Recursive")
                        .with_description("Descend into sub-directories of path.")
                        .with_data_type(DataType::Boolean),
                )
                .with_argument(
                    Argument::new("extensions")
                        .with_title("File extensions")
                        .with_description(
                            "Comma-separated extensions read from a directory path. Defaults to log,txt.",
                        ),
                )
                .with_argument(
                    Argument::new("pattern")
                        .with_title("Line filter")
                        .with_description("Only lines matching this regular expression are shipped."),
                )
                .with_argument(
                    Argument::new("sourcetype")
                        .with_title("Sourcetype")
                        .with_description("Sourcetype stamped on every event."),
                ),
        )
    }

    #[instrument(
        name = "log_input::validate_input",
        target = "log_input::input::LogFileInput",
        skip_all,
        level = "debug"
    )]
    fn validate_input(&self, definition: &ValidationDefinition) -> Validation {
        let params = &definition.parameters;

        let path = params
            .get("path")
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ValidationFailure::new("Parameter \"path\" is required."))?;
        if !Path::new(path).exists() {
            return Err(ValidationFailure::new(format!(
                "Path {path:?} does not exist."
            )));
        }

        StanzaSettings::from_parameters(params)?;
        Ok(())
    }

    #[instrument(
        name = "log_input::stream_events",
        target = "log_input::input::LogFileInput",
        skip_all,
        level = "debug"
    )]
    fn stream_events<W: Write, E: Write>(
        &mut self,
        inputs: &InputDefinition,
        event_writer: &mut EventWriter<W, E>,
    ) -> Result<()> {
        let Some(checkpoint_dir) = inputs.metadata.checkpoint_dir() else {
            bail!("input definition carries no checkpoint_dir");
        };

        for (stanza, params) in &inputs.inputs {
            let Some(path) = params.get("path") else {
                event_writer.log(
                    Severity::Warn,
                    &format!("Stanza {stanza} has no path parameter, skipping."),
                )?;
                continue;
            };
            let settings = StanzaSettings::from_parameters(params)
                .map_err(|failure| anyhow::anyhow!("stanza {stanza}: {failure}"))?;

            let shipped = stream_stanza(
                stanza,
                Path::new(path),
                &settings,
                Path::new(checkpoint_dir),
                event_writer,
            )?;

            event_writer.log(
                Severity::Info,
                &format!("Stanza {stanza} shipped {shipped} events."),
            )?;
        }

        Ok(())
    }
}

/// Per-stanza options after validation.
#[derive(Debug)]
struct StanzaSettings {
    recursive: bool,
    extensions: Vec<String>,
    pattern: Option<Regex>,
    sourcetype: String,
}

impl StanzaSettings {
    fn from_parameters(params: &Parameters) -> std::result::Result<Self, ValidationFailure> {
        let recursive = match params.get("recursive") {
            None => false,
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                ValidationFailure::new(format!(
                    "Parameter \"recursive\" must be true or false, got {raw:?}."
                ))
            })?,
        };

        let extensions: Vec<String> = params
            .get("extensions")
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(DEFAULT_EXTENSIONS)
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        if extensions.is_empty() {
            return Err(ValidationFailure::new(
                "Parameter \"extensions\" lists no file extension.",
            ));
        }

        let pattern = match params.get("pattern").filter(|p| !p.is_empty()) {
            None => None,
            Some(raw) => Some(Regex::new(raw).map_err(|e| {
                ValidationFailure::new(format!("Parameter \"pattern\" is not a valid regex: {e}"))
            })?),
        };

        let sourcetype = params
            .get("sourcetype")
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SOURCETYPE)
            .to_string();

        Ok(Self {
            recursive,
            extensions,
            pattern,
            sourcetype,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Ship new lines of every data file under `root`.
///
/// The checkpoint is saved after each file, so lines already written are
/// never re-shipped even if a later file or the output sink fails. A file
/// that cannot be read is skipped with a `WARN` line and retried next run.
fn stream_stanza<W: Write, E: Write>(
    stanza: &str,
    root: &Path,
    settings: &StanzaSettings,
    checkpoint_dir: &Path,
    event_writer: &mut EventWriter<W, E>,
) -> Result<usize> {
    let checkpoint_path = Checkpoint::path_for(checkpoint_dir, stanza);
    let mut checkpoint = Checkpoint::load(&checkpoint_path)?;
    let mut shipped = 0;

    for file in discover_files(root, settings.recursive, &settings.extensions) {
        let mut lines = match NewLines::open(&file, checkpoint.files.get(&file)) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "Skipping unreadable data file");
                event_writer.log(
                    Severity::Warn,
                    &format!("Skipping data file {}: {e}", file.display()),
                )?;
                continue;
            }
        };

        let source = file.display().to_string();
        let outcome = ship_lines(stanza, &source, settings, &mut lines, event_writer);

        checkpoint.files.insert(file, lines.state());
        checkpoint.save(&checkpoint_path)?;

        match outcome {
            Ok(FileOutcome::Complete(count)) => shipped += count,
            Ok(FileOutcome::ReadFailed(count, e)) => {
                shipped += count;
                tracing::warn!(file = %source, error = %e, "Data file read interrupted");
                event_writer.log(
                    Severity::Warn,
                    &format!("Stopped reading data file {source}: {e}"),
                )?;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to ship lines from {source}"));
            }
        }
    }

    tracing::info!(
        stanza,
        root = %root.display(),
        shipped,
        "Stanza streamed"
    );
    Ok(shipped)
}

/// How far one data file got before the reader stopped.
enum FileOutcome {
    Complete(usize),
    ReadFailed(usize, std::io::Error),
}

fn ship_lines<W: Write, E: Write>(
    stanza: &str,
    source: &str,
    settings: &StanzaSettings,
    lines: &mut NewLines,
    event_writer: &mut EventWriter<W, E>,
) -> crate::error::Result<FileOutcome> {
    let mut shipped = 0;

    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(e) => return Ok(FileOutcome::ReadFailed(shipped, e)),
        };
        if let Some(pattern) = &settings.pattern {
            if !pattern.is_match(&line) {
                continue;
            }
        }

        let event = Event::new(line)
            .with_stanza(stanza)
            .with_source(source)
            .with_sourcetype(settings.sourcetype.as_str())
            .with_datetime(Utc::now());
        event_writer.write_event(&event)?;
        shipped += 1;
    }

    Ok(FileOutcome::Complete(shipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_accept_protocol_literals() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }

    fn settings(pairs: &[(&str, &str)]) -> std::result::Result<StanzaSettings, ValidationFailure> {
        let params = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), crate::definition::models::ParamValue::Single(v.to_string())))
            .collect();
        StanzaSettings::from_parameters(&Parameters(params))
    }

    #[test]
    fn extensions_default_and_normalize() {
        assert_eq!(settings(&[]).unwrap().extensions, ["log", "txt"]);
        assert_eq!(
            settings(&[("extensions", " .json, csv ,")]).unwrap().extensions,
            ["json", "csv"]
        );
        assert!(settings(&[("extensions", ", ,")]).is_err());
    }

    #[test]
    fn scheme_advertises_every_argument() {
        let scheme = LogFileInput.scheme().unwrap();
        let names: Vec<_> = scheme.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            ["path", "recursive", "extensions", "pattern", "sourcetype"]
        );
        assert!(scheme.to_xml().is_ok());
    }
}
