//! `ves-log-input`: ships new log file lines to the VES orchestrator.

use modular_input::{
    Script,
    helpers::load_config::Config,
    instrumentation::tracing::{init_panic_handler, init_tracing},
    log_input::LogFileInput,
};
use std::process::ExitCode;

/// Optional TOML file with diagnostic tracing settings.
const CONFIG_ENV: &str = "VES_MODINPUT_CONFIG";

fn main() -> ExitCode {
    init_panic_handler();

    // Diagnostics only; never affects protocol output or exit status.
    let config = std::env::var_os(CONFIG_ENV)
        .and_then(|path| Config::load(path).ok())
        .unwrap_or_default();
    let _guard = init_tracing(&config.instrumentation).ok().flatten();

    Script::new(LogFileInput).run()
}
