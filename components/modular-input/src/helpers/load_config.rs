// External crates
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::instrument;

/// Modular input binary configuration.
///
/// Only the binary loads this; the script controller never touches files or
/// environment variables beyond the input stream it is handed.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Diagnostic tracing settings.
    pub instrumentation: InstrumentationConfig,
}

impl Config {
    /// Load and parse the configuration file
    #[instrument(
        name = "config_loader",
        target = "helpers::load_config",
        level = "trace",
        skip_all
    )]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        tracing::trace!(
            configuration_file_path = %path_ref.display(),
            "Loading modular input configuration file"
        );

        let config_str = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file at {:?}", path_ref))?;
        let config = Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse TOML from {:?}", path_ref))?;

        tracing::trace!(
            configuration_file_path = %path_ref.display(),
            "Modular input configuration file loaded successfully"
        );
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Where and how diagnostic traces are written.
///
/// Traces always go to a rolling file, never to stdout or stderr, since those
/// streams carry the orchestrator protocol.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct InstrumentationConfig {
    /// Install the tracing subscriber at all.
    pub enabled: bool,
    /// Directory holding the trace files.
    pub log_dir: String,
    /// Trace file name prefix.
    pub file_prefix: String,
    /// `EnvFilter` directive, e.g. `info` or `modular_input=debug`.
    pub level: String,
    /// Write JSON lines instead of plain text.
    pub json: bool,
    /// How often a new trace file is started.
    pub rotation: Rotation,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: ".".to_string(),
            file_prefix: "modular_input.log".to_string(),
            level: "info".to_string(),
            json: false,
            rotation: Rotation::Daily,
        }
    }
}

/// Log file rotation period.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Rotation {
    /// New file every minute.
    Minutely,
    /// New file every hour.
    Hourly,
    /// New file every day.
    Daily,
    /// A single file.
    Never,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(!cfg.instrumentation.enabled);
        assert_eq!(cfg.instrumentation.rotation, Rotation::Daily);
    }

    #[test]
    fn partial_table_keeps_remaining_defaults() {
        let cfg = Config::from_toml(
            r#"
            [instrumentation]
            enabled = true
            log_dir = "/var/log/ves"
            rotation = "hourly"
            "#,
        )
        .unwrap();

        assert!(cfg.instrumentation.enabled);
        assert_eq!(cfg.instrumentation.log_dir, "/var/log/ves");
        assert_eq!(cfg.instrumentation.rotation, Rotation::Hourly);
        assert_eq!(cfg.instrumentation.level, "info");
        assert_eq!(cfg.instrumentation.file_prefix, "modular_input.log");
    }

    #[test]
    fn rejects_unknown_rotation() {
        assert!(Config::from_toml("[instrumentation]\nrotation = \"weekly\"").is_err());
    }

    #[test]
    fn load_reads_file_and_reports_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[instrumentation]\njson = true").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert!(cfg.instrumentation.json);

        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
