//! Permission-preserving stream wrappers.
//!
//! Privileged paths may carry mode bits that block the (possibly
//! unprivileged) process performing the raw byte-level I/O. Each wrapper
//! brackets the raw stream's lifetime with two channel commands: the
//! target's current octal mode is recorded and relaxed to `0777` before the
//! stream opens, and the recorded mode is re-applied when the stream is
//! dropped — on every exit path, including failures while opening or using
//! the raw stream.
//!
//! The saved mode is restored to its exact prior value rather than a fixed
//! default, so repeated read/write round trips do not erode the mode bits
//! of the underlying filesystem.

use std::fs::File;
use std::io::{Read, Write};

use thiserror::Error;

use crate::channel::{ChannelError, SharedChannel};

/// Errors that can occur while opening a permission-preserving stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// `stat -c %a` returned something that is not an octal mode. The
    /// stream is not opened and no chmod is issued: the guard never enters
    /// a relaxed state it cannot restore.
    #[error("stat returned an invalid mode string: {0:?}")]
    InvalidMode(String),

    /// The privileged session is unreachable.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Opening the raw byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scoped save / relax / restore of one path's mode bits.
///
/// Construction records and relaxes the mode; `Drop` restores it. Restore
/// failures cannot propagate out of `Drop` and are logged instead.
struct ModeGuard {
    channel: SharedChannel,
    path: String,
    mode: String,
}

impl ModeGuard {
    fn relax(channel: SharedChannel, path: &str) -> Result<Self, StreamError> {
        let mode = channel.run_for_output(&format!("stat -c %a {path}"))?;
        let mode = mode.trim().to_string();
        if !is_octal_mode(&mode) {
            tracing::warn!(path, %mode, "refusing to relax path with unparseable mode");
            return Err(StreamError::InvalidMode(mode));
        }
        if !channel.run_for_status(&format!("chmod 0777 {path}"))? {
            tracing::warn!(path, "failed to relax mode; raw open may fail");
        }
        tracing::trace!(path, %mode, "recorded mode and relaxed to 0777");
        Ok(Self {
            channel,
            path: path.to_string(),
            mode,
        })
    }
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        let command = format!("chmod 0{} {}", self.mode, self.path);
        match self.channel.run_for_status(&command) {
            Ok(true) => tracing::trace!(path = %self.path, mode = %self.mode, "restored mode"),
            Ok(false) => {
                tracing::warn!(path = %self.path, mode = %self.mode, "mode restore failed")
            }
            Err(e) => {
                tracing::error!(path = %self.path, error = %e, "session lost before mode restore")
            }
        }
    }
}

/// Checks for one to four octal digits, the shapes `stat -c %a` produces.
fn is_octal_mode(mode: &str) -> bool {
    (1..=4).contains(&mode.len()) && mode.bytes().all(|b| b.is_ascii_digit() && b < b'8')
}

/// Parent of an absolute path, with `/` as the parent of top-level entries.
fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

/// Readable byte stream that restores the file's mode bits when dropped.
pub struct RestoringReader {
    // The raw file must close before the guard restores the saved mode, so
    // it is declared first.
    file: File,
    _guard: ModeGuard,
}

impl RestoringReader {
    /// Records and relaxes the mode of `path`, then opens it for reading.
    pub(crate) fn open(channel: SharedChannel, path: &str) -> Result<Self, StreamError> {
        let guard = ModeGuard::relax(channel, path)?;
        let file = File::open(path)?;
        Ok(Self {
            file,
            _guard: guard,
        })
    }
}

impl Read for RestoringReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

/// Writable byte stream that restores the relaxed path's mode when dropped.
///
/// Writing always starts at the beginning of the file; the file is created
/// or truncated on open.
pub struct RestoringWriter {
    file: File,
    _guard: ModeGuard,
}

impl RestoringWriter {
    /// Relaxes the relevant path's mode, then opens `path` for writing.
    ///
    /// When the target already exists the relaxed path is the target
    /// itself; when a new file is being created it is the parent directory,
    /// since creating an entry needs write permission on the container.
    pub(crate) fn create(
        channel: SharedChannel,
        path: &str,
        exists: bool,
    ) -> Result<Self, StreamError> {
        let relax_target = if exists {
            path.to_string()
        } else {
            parent_of(path)
        };
        let guard = ModeGuard::relax(channel, &relax_target)?;
        let file = File::create(path)?;
        Ok(Self {
            file,
            _guard: guard,
        })
    }
}

impl Write for RestoringWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}
