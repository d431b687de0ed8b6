// Local crates
use crate::helpers::load_config::{InstrumentationConfig, Rotation};

// External crates
use anyhow::{Context, Result};
use std::panic;
use tracing::error;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    filter::EnvFilter,
    fmt,
    prelude::*,
    registry::Registry,
};

/// Install the global diagnostic subscriber.
///
/// Output goes to a rolling file only: stdout carries the event stream and
/// stderr the orchestrator log lines. Returns `None` when instrumentation is
/// disabled; otherwise the returned guard must live until the process exits
/// so buffered lines are flushed.
pub fn init_tracing(config: &InstrumentationConfig) -> Result<Option<WorkerGuard>> {
    if !config.enabled {
        return Ok(None);
    }

    let file_appender = match config.rotation {
        Rotation::Minutely => rolling::minutely(&config.log_dir, &config.file_prefix),
        Rotation::Hourly => rolling::hourly(&config.log_dir, &config.file_prefix),
        Rotation::Daily => rolling::daily(&config.log_dir, &config.file_prefix),
        Rotation::Never => rolling::never(&config.log_dir, &config.file_prefix),
    };
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = level_filter(&config.level)?;

    let fmt_layer = (!config.json).then(|| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking_writer.clone())
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    });

    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(non_blocking_writer.clone())
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    });

    let error_layer = ErrorLayer::default();

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt_layer)
        .with(json_layer)
        .with(error_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")?;

    Ok(Some(guard))
}

/// Filter built from the configured directive alone.
fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("Invalid tracing level directive {level:?}"))
}

/// Route panics through `tracing` instead of the default stderr hook, so a
/// faulting hook does not write unstructured text into the orchestrator log.
pub fn init_panic_handler() {
    panic::set_hook(Box::new(|panic_info| {
        let msg = match panic_info.payload().downcast_ref::<&str>() {
            Some(s) => (*s).to_string(),
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => s.clone(),
                None => "Unknown panic".to_string(),
            },
        };

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        error!(
            panic_message = %msg,
            location = %location,
            "Modular input hook panicked"
        );
    }));
}
