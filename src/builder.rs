//! Builder pattern for configuring and creating a [`Logger`].
//!
//! # Example
//!
//! ```rust,no_run
//! use tracelog::{Level, LogApi};
//!
//! // Console only
//! let log = tracelog::builder()
//!     .with_console(true)
//!     .with_level(Level::Info)
//!     .init()
//!     .expect("Failed to initialize logging");
//! log.info("ready");
//!
//! // Console plus a daily file with a "latest" symlink
//! let log = tracelog::builder()
//!     .with_file("app-%Y-%m-%d.log")
//!     .with_log_root("/var/log/app")
//!     .with_symlink("current.log")
//!     .build_logger()
//!     .expect("Failed to create logger");
//! log.error("disk full");
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::init_logging;
use crate::{Level, LogConfig, Logger, Result};

/// A builder for configuring logging and creating the facade.
#[derive(Debug, Clone)]
pub struct LogBuilder {
    config: LogConfig,
}

impl LogBuilder {
    /// Create a new LogBuilder with default configuration.
    pub fn new() -> Self {
        Self {
            config: LogConfig::new(),
        }
    }

    /// Create a LogBuilder from an existing configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self { config }
    }

    /// Enable or disable console logging.
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config = self.config.with_console(enabled);
        self
    }

    /// Set the console's minimum level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.config = self.config.with_level(level);
        self
    }

    /// Set the console output format ("text" or "json").
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.config = self.config.with_format(format.into());
        self
    }

    /// Colorize console output.
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.config.colorize = colorize;
        self
    }

    /// Enable the rotating file sink with a filename pattern such as `app-%Y-%m-%d.log`.
    pub fn with_file(mut self, pattern: impl Into<String>) -> Self {
        self.config = self.config.with_filename(pattern);
        self
    }

    /// Write the file as newline-delimited JSON.
    pub fn with_raw_json(mut self, raw_json: bool) -> Self {
        self.config.raw_json = raw_json;
        self
    }

    /// Maintain a symlink with this name inside the log root.
    pub fn with_symlink(mut self, name: impl Into<String>) -> Self {
        self.config.symlink = Some(name.into());
        self
    }

    /// Base directory for relative file patterns.
    pub fn with_log_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.log_root = Some(root.into());
        self
    }

    /// Set the file sink's minimum level.
    pub fn with_file_level(mut self, level: Level) -> Self {
        self.config.file_level = level;
        self
    }

    /// Get the current configuration without initializing.
    pub fn build(self) -> LogConfig {
        self.config
    }

    /// Create the facade without touching the global `tracing` subscriber.
    pub fn build_logger(self) -> Result<Arc<Logger>> {
        Ok(Arc::new(Logger::new(&self.config)?))
    }

    /// Install the console subscriber and create the facade.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The tracing subscriber is already initialized
    /// - The filename pattern is invalid
    pub fn init(self) -> Result<Arc<Logger>> {
        init_logging(&self.config, None)?;
        self.build_logger()
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
