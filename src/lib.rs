//! # Tracelog
//!
//! A logging facade with time-pattern file rotation and stack-annotated diagnostics.
//!
//! ## Features
//!
//! - Console output through the `tracing` ecosystem
//! - A file sink that rotates whenever its time-tokenized filename changes
//! - A "latest" symlink that follows the active file
//! - `debug`, `error` and `critical` calls carry a trace id and the caller's stack
//! - Text or newline-delimited JSON files
//!
//! ## Example
//!
//! ```rust,no_run
//! use tracelog::{LogApi, LogConfig, Logger};
//!
//! let config = LogConfig::new().with_filename("app-%Y-%m-%d.log");
//! let log = Logger::new(&config)?;
//!
//! log.info("This is an info message");
//! let trace_id = log.error("disk full");
//! # Ok::<(), tracelog::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod level;
pub mod logger;
pub mod record;
pub mod rotation;
pub mod sink;
pub mod trace;
pub mod tracing_init;
pub mod writer;

pub use builder::LogBuilder;
pub use config::LogConfig;
pub use error::{Error, Result};
pub use level::Level;
pub use logger::{ErrorHandler, LogApi, LogHandle, Logger};
pub use record::{LogRecord, Meta};
pub use rotation::{RotationPolicy, is_rotation_due};
pub use sink::{ConsoleSink, Sink, SinkConfig, SinkKind, SinkRegistration};
pub use trace::{TraceAnnotator, TraceEnvelope};
pub use tracing_init::init_logging;
pub use writer::RotatingFileSink;

/// Start configuring logging.
pub fn builder() -> LogBuilder {
    LogBuilder::new()
}
