use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, LogConfig, Result};

/// What still reaches stderr when the console is disabled.
const FAILURES_FILTER: &str = "tracelog=warn";

static LOG_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Install the `tracing` subscriber that renders the console sink, with an optional
/// CLI verbosity override.
///
/// Console lines go through a non-blocking stderr writer; its worker is kept alive for
/// the rest of the process.
pub fn init_logging(config: &LogConfig, cli_verbose: Option<u8>) -> Result<()> {
    let log_spec = effective_log_spec(config, cli_verbose);

    let env_filter = EnvFilter::try_new(&log_spec).map_err(|e| Error::Init(e.to_string()))?;

    if config.console {
        init_console(config, env_filter)
    } else {
        init_no_logging(env_filter)
    }
}

/// Initialize console logging.
fn init_console(config: &LogConfig, env_filter: EnvFilter) -> Result<()> {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    let fmt_layer_builder = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(console_ansi(config));

    let fmt_layer = if config.console_json() {
        fmt_layer_builder.json().boxed()
    } else {
        fmt_layer_builder.boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    *LOG_GUARD.lock().unwrap_or_else(PoisonError::into_inner) = Some(guard);

    Ok(())
}

#[cfg(feature = "ansi")]
fn console_ansi(config: &LogConfig) -> bool {
    config.colorize && !config.console_json()
}

#[cfg(not(feature = "ansi"))]
fn console_ansi(_config: &LogConfig) -> bool {
    false
}

/// Initialize without a console. Only the crate's own warnings and sink failures are
/// written, to stderr.
fn init_no_logging(env_filter: EnvFilter) -> Result<()> {
    let failures_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_filter(EnvFilter::new(FAILURES_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(failures_layer)
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    Ok(())
}

/// Determine the effective log specification, considering config and CLI overrides.
fn effective_log_spec(config: &LogConfig, cli_verbose: Option<u8>) -> String {
    // RUST_LOG takes precedence over everything
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }

    let level = config.level.as_filter();
    match cli_verbose {
        None | Some(0) => level.to_string(),
        Some(1) => format!("{},tracelog=debug", level),
        Some(2) => format!("{},tracelog=trace", level),
        Some(_) => "trace".to_string(),
    }
}
