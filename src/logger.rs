//! The logging facade.
//!
//! [`Logger`] fans records out to its registered sinks. Diagnostic levels (`debug`,
//! `error`, `critical`) are annotated first and produce two records: the message tagged
//! with a trace id, then the caller's stack at `debug`. Both are dispatched under one
//! ordering lock so no other call can land between them.
//!
//! The severity methods live on the [`LogApi`] trait. Any component can expose them by
//! holding a [`LogHandle`] and forwarding [`LogApi::facade`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use time::UtcOffset;
use uuid::Uuid;

use crate::record::{local_offset, now_at};
use crate::sink::{ConsoleSink, Sink, SinkConfig, SinkKind, SinkRegistration};
use crate::trace::{CapturedStack, TraceAnnotator};
use crate::{Error, Level, LogConfig, LogRecord, Meta, Result, RotatingFileSink};

/// Receives sink failures. Must not log through the facade that reports to it.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Attempts per sink before a write rejected with `RotationInProgress` is given up.
const ROTATION_RETRIES: usize = 3;

/// Frames between the stack capture and the caller: the `LogApi` method itself.
const ENTRY_FRAMES: usize = 1;

struct Route {
    registration: SinkRegistration,
    sink: Arc<dyn Sink>,
}

/// Multi-sink logging facade.
pub struct Logger {
    routes: Vec<Route>,
    annotator: TraceAnnotator,
    /// Any sink other than the console is registered.
    durable: bool,
    order: Mutex<()>,
    on_error: ErrorHandler,
    /// Offset every record is stamped with, fixed at construction.
    offset: UtcOffset,
}

impl Logger {
    /// Build the console and rotating file sinks described by `config`.
    pub fn new(config: &LogConfig) -> Result<Self> {
        let mut sinks: Vec<(SinkRegistration, Arc<dyn Sink>)> = Vec::new();

        if config.console {
            let registration = SinkRegistration::new(SinkKind::Console, config.level).with_config(
                SinkConfig {
                    colorize: config.colorize,
                    json_output: config.console_json(),
                    ..Default::default()
                },
            );
            sinks.push((registration, Arc::new(ConsoleSink::new())));
        }

        if let Some(pattern) = &config.filename {
            let log_root = config.resolved_log_root();
            let sink = RotatingFileSink::new(
                pattern.clone(),
                log_root.clone(),
                config.symlink.as_deref(),
                config.raw_json,
            )?;
            let registration = SinkRegistration::new(SinkKind::RotatingFile, config.file_level)
                .with_config(SinkConfig {
                    colorize: false,
                    json_output: config.raw_json,
                    symlink: config.symlink.clone(),
                    log_root,
                });
            sinks.push((registration, Arc::new(sink)));
        }

        Ok(Self::with_sinks(sinks))
    }

    /// Build a facade over arbitrary sinks, dispatched in the given order.
    pub fn with_sinks(sinks: Vec<(SinkRegistration, Arc<dyn Sink>)>) -> Self {
        let durable = sinks
            .iter()
            .any(|(registration, _)| registration.kind != SinkKind::Console);
        let routes = sinks
            .into_iter()
            .map(|(registration, sink)| Route { registration, sink })
            .collect();

        Self {
            routes,
            annotator: TraceAnnotator::new(),
            durable,
            order: Mutex::new(()),
            on_error: Arc::new(report_error),
            offset: local_offset(),
        }
    }

    /// Replace the error channel.
    pub fn on_error(mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Arc::new(handler);
        self
    }

    /// Stamp records with `offset` instead of the local offset.
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn registrations(&self) -> impl Iterator<Item = &SinkRegistration> {
        self.routes.iter().map(|route| &route.registration)
    }

    /// Whether a sink other than the console is registered.
    pub fn has_durable_sink(&self) -> bool {
        self.durable
    }

    /// A handle exposing the severity methods without exposing the facade itself.
    pub fn extend(self: &Arc<Self>) -> LogHandle {
        LogHandle {
            logger: Arc::clone(self),
        }
    }

    fn emit_traced(
        &self,
        stack: CapturedStack,
        level: Level,
        message: &str,
        meta: Option<Meta>,
    ) -> Uuid {
        let envelope = self.annotator.annotate_captured(message, stack);
        if envelope.degraded {
            (self.on_error)(&Error::StackCaptureDegraded);
        }

        let time = now_at(self.offset);
        let primary = LogRecord::at(level, envelope.decorated_message, time)
            .with_meta(meta)
            .with_trace_id(envelope.id);
        let trace =
            LogRecord::at(Level::Debug, envelope.stack_text, time).with_trace_id(envelope.id);

        let _order = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        self.dispatch(&primary);
        self.dispatch(&trace);

        envelope.id
    }

    fn emit_plain(&self, level: Level, message: &str, meta: Option<Meta>) {
        // Console-only setups keep informational lines free of metadata.
        let meta = if level == Level::Info && !self.durable {
            None
        } else {
            meta
        };
        let record = LogRecord::at(level, message, now_at(self.offset)).with_meta(meta);

        let _order = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        self.dispatch(&record);
    }

    fn dispatch(&self, record: &LogRecord) {
        for route in &self.routes {
            if !route.registration.admits(record.level) {
                continue;
            }
            if let Err(err) = deliver(route.sink.as_ref(), record) {
                (self.on_error)(&err);
                if route.registration.kind != SinkKind::Console {
                    self.fall_back(record);
                }
            }
        }
    }

    /// Hand a record that a durable sink lost to the console, unless the console
    /// already took it.
    fn fall_back(&self, record: &LogRecord) {
        let console = self
            .routes
            .iter()
            .find(|route| route.registration.kind == SinkKind::Console);

        if let Some(console) = console
            && !console.registration.admits(record.level)
            && let Err(err) = console
                .sink
                .write_fallback(record, console.registration.min_level)
        {
            (self.on_error)(&err);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field(
                "registrations",
                &self.registrations().collect::<Vec<_>>(),
            )
            .field("durable", &self.durable)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Writes through the facade are serialized by its ordering lock, so the built-in file
/// sink only reports `RotationInProgress` here when it is also shared outside the facade.
fn deliver(sink: &dyn Sink, record: &LogRecord) -> Result<()> {
    let mut attempts = 1;
    loop {
        match sink.write(record) {
            Err(Error::RotationInProgress) if attempts < ROTATION_RETRIES => {
                attempts += 1;
                std::thread::yield_now();
            }
            result => return result,
        }
    }
}

/// Default error channel: report through `tracing`, or straight to stderr when no
/// subscriber would show the event.
fn report_error(err: &Error) {
    if !tracing::enabled!(tracing::Level::ERROR) {
        let _ = write_unrouted(err, &mut std::io::stderr().lock());
        return;
    }
    match err {
        Error::SymlinkUpdateFailed { .. } => tracing::warn!(error = %err, "log sink degraded"),
        Error::StackCaptureDegraded => tracing::debug!(error = %err, "stack trace not trimmed"),
        _ => tracing::error!(error = %err, "log sink failed"),
    }
}

fn write_unrouted(err: &Error, out: &mut impl std::io::Write) -> std::io::Result<()> {
    writeln!(out, "tracelog: {}", err)
}

/// The severity methods.
///
/// Diagnostic methods return the trace id shared by the message and stack records.
pub trait LogApi {
    fn facade(&self) -> &Logger;

    #[inline(never)]
    fn debug(&self, message: &str) -> Uuid {
        let stack = CapturedStack::capture(ENTRY_FRAMES);
        self.facade().emit_traced(stack, Level::Debug, message, None)
    }

    fn info(&self, message: &str) {
        self.facade().emit_plain(Level::Info, message, None)
    }

    /// Alias of [`LogApi::info`].
    fn log(&self, message: &str) {
        self.facade().emit_plain(Level::Info, message, None)
    }

    fn notice(&self, message: &str) {
        self.facade().emit_plain(Level::Notice, message, None)
    }

    fn warning(&self, message: &str) {
        self.facade().emit_plain(Level::Warning, message, None)
    }

    /// Alias of [`LogApi::warning`].
    fn warn(&self, message: &str) {
        self.facade().emit_plain(Level::Warning, message, None)
    }

    #[inline(never)]
    fn error(&self, message: &str) -> Uuid {
        let stack = CapturedStack::capture(ENTRY_FRAMES);
        self.facade().emit_traced(stack, Level::Error, message, None)
    }

    /// Alias of [`LogApi::error`].
    #[inline(never)]
    fn err(&self, message: &str) -> Uuid {
        let stack = CapturedStack::capture(ENTRY_FRAMES);
        self.facade().emit_traced(stack, Level::Error, message, None)
    }

    #[inline(never)]
    fn critical(&self, message: &str) -> Uuid {
        let stack = CapturedStack::capture(ENTRY_FRAMES);
        self.facade().emit_traced(stack, Level::Critical, message, None)
    }

    /// Alias of [`LogApi::critical`].
    #[inline(never)]
    fn crit(&self, message: &str) -> Uuid {
        let stack = CapturedStack::capture(ENTRY_FRAMES);
        self.facade().emit_traced(stack, Level::Critical, message, None)
    }

    fn alert(&self, message: &str) {
        self.facade().emit_plain(Level::Alert, message, None)
    }

    fn emergency(&self, message: &str) {
        self.facade().emit_plain(Level::Emergency, message, None)
    }

    /// Log at any level with metadata; diagnostic levels are annotated as usual.
    #[inline(never)]
    fn log_with(&self, level: Level, message: &str, meta: Meta) -> Option<Uuid> {
        if level.is_diagnostic() {
            let stack = CapturedStack::capture(ENTRY_FRAMES);
            Some(self.facade().emit_traced(stack, level, message, Some(meta)))
        } else {
            self.facade().emit_plain(level, message, Some(meta));
            None
        }
    }
}

impl LogApi for Logger {
    fn facade(&self) -> &Logger {
        self
    }
}

/// Shared reference to a [`Logger`] that only exposes [`LogApi`].
#[derive(Clone)]
pub struct LogHandle {
    logger: Arc<Logger>,
}

impl LogApi for LogHandle {
    fn facade(&self) -> &Logger {
        &self.logger
    }
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LogHandle").field(&self.logger).finish()
    }
}
