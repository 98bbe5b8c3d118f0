use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Level;

/// Environment variable supplying the log root when none is configured.
pub const LOG_ROOT_ENV: &str = "LOG_ROOT";

/// Configuration for logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Enable console logging
    #[serde(default = "default_console")]
    pub console: bool,
    /// Minimum level for the console
    #[serde(default = "default_log_level")]
    pub level: Level,
    /// Colorize console output (needs the `ansi` feature)
    #[serde(default)]
    pub colorize: bool,
    /// Console format ("text" or "json")
    #[serde(default = "default_format")]
    pub format: String,
    /// Filename pattern for the rotating file sink, e.g. `app-%Y-%m-%d.log`
    #[serde(default)]
    pub filename: Option<String>,
    /// Write one JSON object per line to the file instead of text
    #[serde(default)]
    pub raw_json: bool,
    /// Name of a symlink inside the log root that tracks the active file
    #[serde(default)]
    pub symlink: Option<String>,
    /// Base directory for relative filename patterns
    #[serde(default)]
    pub log_root: Option<PathBuf>,
    /// Minimum level for the file
    #[serde(default = "default_file_level")]
    pub file_level: Level,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self {
            console: default_console(),
            level: default_log_level(),
            colorize: false,
            format: default_format(),
            filename: None,
            raw_json: false,
            symlink: None,
            log_root: None,
            file_level: default_file_level(),
        }
    }

    /// Enable console logging
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Set console level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set console format
    pub fn with_format(mut self, format: String) -> Self {
        self.format = format;
        self
    }

    /// Set the rotating file pattern
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Base directory for the file sink, resolved once: explicit setting, then
    /// `LOG_ROOT`, then the working directory.
    pub fn resolved_log_root(&self) -> PathBuf {
        if let Some(root) = &self.log_root {
            return root.clone();
        }
        match std::env::var_os(LOG_ROOT_ENV) {
            Some(root) if !root.is_empty() => PathBuf::from(root),
            _ => PathBuf::from("."),
        }
    }

    /// Whether the console renders JSON.
    pub fn console_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_console() -> bool {
    true
}

fn default_log_level() -> Level {
    Level::Info
}

fn default_file_level() -> Level {
    Level::Debug
}

fn default_format() -> String {
    "text".to_string()
}
