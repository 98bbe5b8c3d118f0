use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use time::OffsetDateTime;

use crate::rotation::{RotationPolicy, is_rotation_due};
use crate::sink::Sink;
use crate::{Error, LogRecord, Result};

/// State of the current log file.
///
/// The path and handle are always replaced together.
#[derive(Debug)]
struct FileState {
    file: File,
    path: PathBuf,
}

/// A sink that writes to a file whose path is derived from the record time.
///
/// Each write resolves the filename pattern for the record's time; when the result
/// differs from the open file, the sink switches to the new file first.
#[derive(Debug)]
pub struct RotatingFileSink {
    policy: RotationPolicy,
    /// Full path of the "latest" symlink, if configured.
    symlink: Option<PathBuf>,
    json: bool,
    /// Set while a rotation is switching files.
    rotating: AtomicBool,
    opens: AtomicUsize,
    state: Mutex<Option<FileState>>,
}

/// Clears the rotating flag even when the rotation bails out early.
struct RotatingGuard<'a>(&'a AtomicBool);

impl Drop for RotatingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RotatingFileSink {
    /// Create a sink for `pattern` under `log_root`. No file is opened until the first write.
    pub fn new(
        pattern: impl Into<String>,
        log_root: impl Into<PathBuf>,
        symlink: Option<&str>,
        json: bool,
    ) -> Result<Self> {
        let policy = RotationPolicy::new(pattern, log_root)?;
        let symlink = symlink.map(|name| policy.log_root().join(name));

        Ok(Self {
            policy,
            symlink,
            json,
            rotating: AtomicBool::new(false),
            opens: AtomicUsize::new(0),
            state: Mutex::new(None),
        })
    }

    /// Path of the file currently open, if any write has happened.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock_state().as_ref().map(|s| s.path.clone())
    }

    /// Number of file handles opened so far.
    pub fn handle_opens(&self) -> usize {
        self.opens.load(Ordering::Acquire)
    }

    /// Whether a rotation is currently switching files.
    pub fn is_rotating(&self) -> bool {
        self.rotating.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Option<FileState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `record` to the file resolved for `now`, rotating first if needed.
    pub fn write_at(&self, record: &LogRecord, now: OffsetDateTime) -> Result<()> {
        let next = self.policy.resolve(now)?;

        if self.rotating.load(Ordering::Acquire) {
            return Err(Error::RotationInProgress);
        }

        let line = if self.json {
            record.to_json_line().map_err(io::Error::from)?
        } else {
            record.to_text_line()
        };

        let mut guard = self.lock_state();

        let current = guard.as_ref().map(|s| s.path.as_path());
        if is_rotation_due(current, &next) {
            let fresh = self.rotate(&next)?;
            // The old handle is closed only once the new one is in place.
            let previous = guard.replace(fresh);
            drop(previous);
        }

        match guard.as_mut() {
            Some(state) => {
                state.file.write_all(line.as_bytes())?;
                Ok(())
            }
            None => Err(Error::Io(io::Error::other("no log file open"))),
        }
    }

    /// Open the file for `next`. The caller holds the state lock.
    fn rotate(&self, next: &Path) -> Result<FileState> {
        if self
            .rotating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::RotationInProgress);
        }
        let _rotating = RotatingGuard(&self.rotating);

        if let Some(parent) = next.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| Error::RotationFailed {
                path: next.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(next)
            .map_err(|source| Error::RotationFailed {
                path: next.to_path_buf(),
                source,
            })?;
        self.opens.fetch_add(1, Ordering::AcqRel);

        if let Some(link) = &self.symlink
            && let Err(err) = update_symlink(link, next)
        {
            tracing::warn!(error = %err, "symlink not updated");
        }

        tracing::debug!(path = %next.display(), "log file rotated");

        Ok(FileState {
            file,
            path: next.to_path_buf(),
        })
    }
}

impl Sink for RotatingFileSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        self.write_at(record, record.time)
    }
}

/// Point `link` at `target`, replacing whatever was there.
///
/// Symlink targets resolve against the link's directory, so a target inside that
/// directory is stored relative to it.
pub fn update_symlink(link: &Path, target: &Path) -> Result<()> {
    let target = link
        .parent()
        .and_then(|dir| target.strip_prefix(dir).ok())
        .unwrap_or(target);
    replace_symlink(link, target).map_err(|source| Error::SymlinkUpdateFailed {
        link: link.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn replace_symlink(link: &Path, target: &Path) -> io::Result<()> {
    // Link under a temporary name, then rename over the old link in one step.
    let mut tmp = link.as_os_str().to_owned();
    tmp.push(format!(".tmp{}", std::process::id()));
    let tmp = PathBuf::from(tmp);

    let _ = std::fs::remove_file(&tmp);
    std::os::unix::fs::symlink(target, &tmp)?;
    std::fs::rename(&tmp, link).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}

#[cfg(windows)]
fn replace_symlink(link: &Path, target: &Path) -> io::Result<()> {
    match std::fs::remove_file(link) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn replace_symlink(_link: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}
