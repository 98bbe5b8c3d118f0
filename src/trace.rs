//! Correlation ids and caller stack traces for diagnostic records.
//!
//! A stack is captured unresolved at the public entry point, trimmed, and only the kept
//! frames are symbolized. Trimming locates the capture function's own frame by address
//! rather than by name, then drops a fixed number of frames above it. Entry points that
//! capture must be `#[inline(never)]` and capture before doing anything else, so the
//! count holds in optimized builds.

use std::fmt::Write as _;

use backtrace::Frame;
use uuid::Uuid;

/// Output of [`TraceAnnotator::annotate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEnvelope {
    pub id: Uuid,
    /// `"<message> | trace: <id>"`
    pub decorated_message: String,
    /// Caller frames, innermost first, one per line.
    pub stack_text: String,
    /// Internal frames could not be located and were left in `stack_text`.
    pub degraded: bool,
}

/// Random v4 id; no coordination between processes is needed.
pub fn new_trace_id() -> Uuid {
    Uuid::new_v4()
}

/// Unresolved frames plus the index of the first frame worth showing.
pub struct CapturedStack {
    frames: Vec<Frame>,
    start: Option<usize>,
}

impl CapturedStack {
    /// Capture the current stack, marking `skip` frames above this call as internal.
    /// `skip == 1` starts the trace at the caller of the function calling `capture`.
    #[inline(never)]
    pub fn capture(skip: usize) -> Self {
        let mut frames = Vec::new();
        backtrace::trace(|frame| {
            frames.push(frame.clone());
            true
        });

        let addresses: Vec<usize> = frames
            .iter()
            .map(|f| f.symbol_address() as usize)
            .collect();
        let marker = Self::capture as *const () as usize;
        let start = elide_internal(&addresses, marker, skip);

        Self { frames, start }
    }

    /// Internal frames could not be located; `render` shows everything.
    pub fn is_degraded(&self) -> bool {
        self.start.is_none()
    }

    /// One `    at name (file:line)` line per kept frame.
    pub fn render(&self) -> String {
        render_frames(&self.frames[self.start.unwrap_or(0)..])
    }
}

/// Produces trace envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceAnnotator;

impl TraceAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Annotate `message` with a stack starting at the caller of `annotate`.
    #[inline(never)]
    pub fn annotate(&self, message: &str) -> TraceEnvelope {
        let stack = CapturedStack::capture(1);
        self.annotate_captured(message, stack)
    }

    /// Annotate `message` with a stack captured earlier by the entry point.
    pub fn annotate_captured(&self, message: &str, stack: CapturedStack) -> TraceEnvelope {
        let id = new_trace_id();
        TraceEnvelope {
            id,
            decorated_message: format!("{} | trace: {}", message, id),
            stack_text: stack.render(),
            degraded: stack.is_degraded(),
        }
    }
}

/// Index of the first frame to keep, or `None` when the marker frame is missing or
/// nothing would be left after skipping.
fn elide_internal(addresses: &[usize], marker: usize, skip: usize) -> Option<usize> {
    let position = addresses.iter().position(|&addr| addr == marker)?;
    let start = position + 1 + skip;
    (start < addresses.len()).then_some(start)
}

fn render_frames(frames: &[Frame]) -> String {
    let mut out = String::new();

    for frame in frames {
        let mut resolved = false;
        backtrace::resolve_frame(frame, |symbol| {
            resolved = true;
            let name = symbol
                .name()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            let _ = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => {
                    writeln!(out, "    at {} ({}:{})", name, file.display(), line)
                }
                _ => writeln!(out, "    at {}", name),
            };
        });
        if !resolved {
            let _ = writeln!(out, "    at <unknown> ({:?})", frame.ip());
        }
    }

    if out.ends_with('\n') {
        out.pop();
    }
    out
}
