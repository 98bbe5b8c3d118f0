use std::path::PathBuf;

use crate::{Level, LogRecord, Result};

/// A destination for log records.
///
/// Implementations must write each record as one unit and preserve the order in which
/// `write` calls are submitted.
pub trait Sink: Send + Sync {
    fn write(&self, record: &LogRecord) -> Result<()>;

    /// Write a record another sink failed to deliver.
    ///
    /// `floor` is this sink's own minimum level, which the record is below. Sinks whose
    /// output passes through a second filter must make sure the record still gets out.
    fn write_fallback(&self, record: &LogRecord, _floor: Level) -> Result<()> {
        self.write(record)
    }
}

/// What a registered sink is, as far as the facade's fallback rules are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    RotatingFile,
    /// Any other [`Sink`] implementation; treated like a durable sink.
    Custom,
}

/// Options recognized by the built-in sinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkConfig {
    pub colorize: bool,
    pub json_output: bool,
    pub symlink: Option<String>,
    pub log_root: PathBuf,
}

/// A sink's place in the facade: created at construction, never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRegistration {
    pub kind: SinkKind,
    pub min_level: Level,
    pub config: SinkConfig,
}

impl SinkRegistration {
    pub fn new(kind: SinkKind, min_level: Level) -> Self {
        Self {
            kind,
            min_level,
            config: SinkConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether a record at `level` passes this sink's filter.
    pub fn admits(&self, level: Level) -> bool {
        level >= self.min_level
    }
}

macro_rules! console_event {
    ($level:expr, $record:expr, $trace_id:expr, $meta:expr) => {
        tracing::event!(
            target: "tracelog",
            $level,
            severity = %$record.level,
            trace_id = $trace_id,
            meta = $meta,
            "{}",
            $record.message
        )
    };
}

/// Forwards records to the `tracing` dispatcher.
///
/// Formatting, colors and the final level filter belong to the installed subscriber, see
/// [`init_logging`](crate::init_logging).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl ConsoleSink {
    /// Emit `record` as a `tracing` event at the level `as_level` maps to. The record's
    /// own level is kept in the `severity` field.
    fn emit(&self, record: &LogRecord, as_level: Level) {
        let trace_id = record.trace_id.map(|id| id.to_string());
        let trace_id = trace_id.as_deref();
        let meta = record.meta_json();
        let meta = meta.as_deref();

        // `tracing::event!` needs the level as a constant.
        match as_level {
            Level::Debug => console_event!(tracing::Level::DEBUG, record, trace_id, meta),
            Level::Info | Level::Notice => {
                console_event!(tracing::Level::INFO, record, trace_id, meta)
            }
            Level::Warning => console_event!(tracing::Level::WARN, record, trace_id, meta),
            Level::Error | Level::Critical | Level::Alert | Level::Emergency => {
                console_event!(tracing::Level::ERROR, record, trace_id, meta)
            }
        }
    }
}

impl Sink for ConsoleSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        self.emit(record, record.level);
        Ok(())
    }

    /// The installed subscriber filters on the same level as this sink, so the event is
    /// raised to `floor` to get past it.
    fn write_fallback(&self, record: &LogRecord, floor: Level) -> Result<()> {
        self.emit(record, record.level.max(floor));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(level: &str, f: impl FnOnce()) -> String {
        let buf = Captured::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(level))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_registration_admits() {
        let reg = SinkRegistration::new(SinkKind::Console, Level::Warning);
        assert!(!reg.admits(Level::Info));
        assert!(reg.admits(Level::Warning));
        assert!(reg.admits(Level::Emergency));
    }

    #[test]
    fn test_console_sink_emits_event() {
        let out = capture("debug", || {
            let record = LogRecord::new(Level::Critical, "reactor breach");
            ConsoleSink::new().write(&record).unwrap();
        });
        assert!(out.contains("ERROR"));
        assert!(out.contains("reactor breach"));
        assert!(out.contains("severity=crit"));
    }

    #[test]
    fn test_console_sink_includes_meta_and_trace_id() {
        let id = uuid::Uuid::new_v4();
        let out = capture("debug", || {
            let mut meta = crate::Meta::new();
            meta.insert("user".to_string(), serde_json::json!("alice"));
            let record = LogRecord::new(Level::Notice, "signed in")
                .with_meta(Some(meta))
                .with_trace_id(id);
            ConsoleSink::new().write(&record).unwrap();
        });
        assert!(out.contains("INFO"));
        assert!(out.contains(&id.to_string()));
        assert!(out.contains("alice"));
    }

    #[test]
    fn test_console_fallback_passes_console_filter() {
        let out = capture(Level::Warning.as_filter(), || {
            let record = LogRecord::new(Level::Info, "lost by the file");
            ConsoleSink::new()
                .write_fallback(&record, Level::Warning)
                .unwrap();
        });
        assert!(out.contains("WARN"));
        assert!(out.contains("lost by the file"));
        assert!(out.contains("severity=info"));
    }

    #[test]
    fn test_console_subscriber_filters_debug() {
        let out = capture("info", || {
            ConsoleSink::new()
                .write(&LogRecord::new(Level::Debug, "hidden"))
                .unwrap();
        });
        assert!(!out.contains("hidden"));
    }
}
