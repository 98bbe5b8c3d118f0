use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::format_description::OwnedFormatItem;

use crate::{Error, Result};

/// Translate strftime-style tokens into a `time` format description.
///
/// Supported tokens: `%Y %y %m %d %H %M %S %j %b %a %%`.
fn to_format_description(pattern: &str) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '%' => {
                let token = chars.next().ok_or_else(|| {
                    Error::Config(format!("dangling '%' at end of pattern: {}", pattern))
                })?;
                let component = match token {
                    'Y' => "[year]",
                    'y' => "[year repr:last_two]",
                    'm' => "[month]",
                    'd' => "[day]",
                    'H' => "[hour]",
                    'M' => "[minute]",
                    'S' => "[second]",
                    'j' => "[ordinal]",
                    'b' => "[month repr:short]",
                    'a' => "[weekday repr:short]",
                    '%' => "%",
                    other => {
                        return Err(Error::Config(format!(
                            "unsupported time token %{} in pattern: {}",
                            other, pattern
                        )));
                    }
                };
                out.push_str(component);
            }
            // `[` opens a component in format descriptions; `[[` is a literal bracket.
            '[' => out.push_str("[["),
            c => out.push(c),
        }
    }

    Ok(out)
}

/// Maps a time-tokenized filename pattern to concrete paths.
///
/// The rotation cadence is whatever the finest token in the pattern is: `%Y-%m-%d`
/// rotates daily, adding `%H` rotates hourly, a pattern without tokens never rotates.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    pattern: String,
    format: OwnedFormatItem,
    log_root: PathBuf,
}

impl RotationPolicy {
    /// Parse `pattern` once; relative results are placed under `log_root`.
    pub fn new(pattern: impl Into<String>, log_root: impl Into<PathBuf>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(Error::Config("empty filename pattern".to_string()));
        }
        let description = to_format_description(&pattern)?;
        let format = time::format_description::parse_owned::<1>(&description)
            .map_err(time::error::Error::from)?;

        Ok(Self {
            pattern,
            format,
            log_root: log_root.into(),
        })
    }

    /// The pattern as configured.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Base directory for relative patterns.
    pub fn log_root(&self) -> &Path {
        &self.log_root
    }

    /// Substitute the time tokens using `now`.
    pub fn resolve(&self, now: OffsetDateTime) -> Result<PathBuf> {
        let rendered = now
            .format(&self.format)
            .map_err(time::error::Error::from)?;
        let path = PathBuf::from(rendered);

        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.log_root.join(path))
        }
    }
}

/// A rotation is due on the first write and whenever the resolved path changes.
pub fn is_rotation_due(previous: Option<&Path>, next: &Path) -> bool {
    previous != Some(next)
}
