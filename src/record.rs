use once_cell::sync::Lazy;
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::Level;

/// Structured metadata attached to a record.
pub type Meta = serde_json::Map<String, serde_json::Value>;

// Looked up once. On unix the local offset is unavailable once the process has more
// than one thread, so asking per record would flip between local time and UTC.
static LOCAL_OFFSET: Lazy<UtcOffset> =
    Lazy::new(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC));

/// The process's local offset, or UTC when it could not be determined.
pub fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET
}

/// Current wall-clock time at `offset`.
pub fn now_at(offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset)
}

/// Current wall-clock time at the process's local offset.
pub fn now() -> OffsetDateTime {
    now_at(local_offset())
}

/// A single log record.
///
/// Records are immutable once built. For diagnostic calls the facade builds two records
/// sharing one `trace_id`: the decorated message and the stack text.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub message: String,
    pub level: Level,
    /// Submission time, used by rotating sinks to pick the target file.
    pub time: OffsetDateTime,
    /// `time` rendered as RFC 3339.
    pub timestamp: String,
    pub meta: Option<Meta>,
    pub trace_id: Option<Uuid>,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: &'a str,
    level: Level,
    message: &'a str,
    meta: Option<&'a Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a Uuid>,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self::at(level, message, now())
    }

    /// Create a record stamped with `time`.
    pub fn at(level: Level, message: impl Into<String>, time: OffsetDateTime) -> Self {
        let timestamp = time.format(&Rfc3339).unwrap_or_else(|_| time.to_string());
        Self {
            message: message.into(),
            level,
            time,
            timestamp,
            meta: None,
            trace_id: None,
        }
    }

    /// Attach metadata.
    pub fn with_meta(mut self, meta: Option<Meta>) -> Self {
        self.meta = meta;
        self
    }

    /// Attach a correlation id.
    pub fn with_trace_id(mut self, id: Uuid) -> Self {
        self.trace_id = Some(id);
        self
    }

    /// Metadata as compact JSON, if any.
    pub fn meta_json(&self) -> Option<String> {
        self.meta
            .as_ref()
            .map(|m| serde_json::Value::Object(m.clone()).to_string())
    }

    /// `<timestamp> <level>: <message>[ <meta>]` followed by a newline.
    pub fn to_text_line(&self) -> String {
        let mut line = format!("{} {}: {}", self.timestamp, self.level, self.message);
        if let Some(meta) = self.meta_json() {
            line.push(' ');
            line.push_str(&meta);
        }
        line.push('\n');
        line
    }

    /// One JSON object followed by a newline.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(&JsonLine {
            timestamp: &self.timestamp,
            level: self.level,
            message: &self.message,
            meta: self.meta.as_ref(),
            trace_id: self.trace_id.as_ref(),
        })?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn test_clock_offset_is_fixed() {
        let offset = time::macros::offset!(+9);
        assert_eq!(now_at(offset).offset(), offset);

        // the same offset before and after another thread exists
        let before = now().offset();
        std::thread::spawn(|| ()).join().unwrap();
        assert_eq!(now().offset(), before);
        assert_eq!(before, local_offset());
    }

    fn sample_meta() -> Meta {
        let mut meta = Meta::new();
        meta.insert("disk".to_string(), json!("/dev/sda1"));
        meta
    }

    #[test]
    fn test_text_line_without_meta() {
        let record = LogRecord::at(Level::Warning, "low space", datetime!(2024-01-01 12:00:00 UTC));
        assert_eq!(
            record.to_text_line(),
            "2024-01-01T12:00:00Z warning: low space\n"
        );
    }

    #[test]
    fn test_text_line_with_meta() {
        let record = LogRecord::at(Level::Error, "disk full", datetime!(2024-01-01 12:00:00 UTC))
            .with_meta(Some(sample_meta()));
        let line = record.to_text_line();
        assert!(line.starts_with("2024-01-01T12:00:00Z error: disk full {"));
        assert!(line.contains("\"disk\":\"/dev/sda1\""));
        assert!(line.ends_with("}\n"));
    }

    #[test]
    fn test_json_line_fields() {
        let id = Uuid::new_v4();
        let record = LogRecord::at(Level::Critical, "boom", datetime!(2024-01-02 00:00:01 UTC))
            .with_meta(Some(sample_meta()))
            .with_trace_id(id);
        let line = record.to_json_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["timestamp"], "2024-01-02T00:00:01Z");
        assert_eq!(value["level"], "crit");
        assert_eq!(value["message"], "boom");
        assert_eq!(value["meta"]["disk"], "/dev/sda1");
        assert_eq!(value["trace_id"], id.to_string());
    }

    #[test]
    fn test_json_line_keeps_multiline_message_on_one_line() {
        let record = LogRecord::new(Level::Debug, "    at a\n    at b");
        let line = record.to_json_line().unwrap();
        assert_eq!(line.matches('\n').count(), 1);
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert!(value["meta"].is_null());
        assert!(value.get("trace_id").is_none());
    }
}
