//! File handles: one immutable snapshot per filesystem entry.
//!
//! A handle is plain data (a parsed listing entry, an absolute path, a
//! shared channel reference) plus stateless operations against the channel.
//! Handles are created on demand and never cached: mutating an entry does
//! not update any existing handle, callers re-stat to observe effects.
//!
//! Paths are interpolated verbatim into command strings; names containing
//! shell metacharacters are unsafe at this layer (no quoting stance is
//! taken, matching the command vocabulary the provider relies on).

use std::sync::Arc;
use std::time::SystemTime;

use ls_output::{parse_line, LsEntry};

use crate::channel::{ChannelError, SharedChannel};
use crate::files::stream::{RestoringReader, RestoringWriter, StreamError};

/// One filesystem entry reached through the privileged session.
///
/// The snapshot is immutable; the only shared mutable state is the channel,
/// which all handles in a tree serialize through.
#[derive(Clone)]
pub struct ShellFile {
    channel: SharedChannel,
    entry: LsEntry,
    path: String,
}

impl ShellFile {
    /// Builds a handle from a parsed entry and its absolute path.
    pub fn new(channel: SharedChannel, entry: LsEntry, path: String) -> Self {
        Self {
            channel,
            entry,
            path,
        }
    }

    /// Builds a handle for a path that was queried but not found.
    pub fn missing(channel: SharedChannel, path: String) -> Self {
        let name = path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("/")
            .to_string();
        Self::new(channel, LsEntry::missing(name), path)
    }

    /// The fully-qualified path this handle was built for.
    pub fn absolute_path(&self) -> &str {
        &self.path
    }

    /// The entry's base name.
    pub fn name(&self) -> &str {
        self.entry.name()
    }

    /// Whether the snapshot saw a directory.
    pub fn is_directory(&self) -> bool {
        self.entry.is_directory()
    }

    /// Whether the snapshot saw a regular file.
    pub fn is_file(&self) -> bool {
        self.entry.is_file()
    }

    /// Whether the entry existed when the snapshot was taken.
    pub fn exists(&self) -> bool {
        self.entry.exists()
    }

    /// Size in bytes at snapshot time.
    pub fn size(&self) -> u64 {
        self.entry.size()
    }

    /// Last modification time at snapshot time.
    pub fn modified(&self) -> SystemTime {
        self.entry.modified()
    }

    /// The parsed entry backing this handle.
    pub fn entry(&self) -> &LsEntry {
        &self.entry
    }

    /// Permission is not modeled at the metadata level; access failures
    /// surface later from a command's result code.
    pub fn is_readable(&self) -> bool {
        true
    }

    /// See [`ShellFile::is_readable`].
    pub fn is_writable(&self) -> bool {
        true
    }

    /// See [`ShellFile::is_readable`].
    pub fn is_removable(&self) -> bool {
        true
    }

    /// Timestamp mutation on privileged paths is not implemented; always
    /// reports failure.
    pub fn set_modified(&self, _time: SystemTime) -> bool {
        tracing::trace!(path = %self.path, "set_modified is unsupported");
        false
    }

    /// Creates this path as a directory.
    ///
    /// `Ok(false)` means the command ran and failed; `Err` means the
    /// session is gone.
    pub fn mkdir(&self) -> Result<bool, ChannelError> {
        tracing::trace!(path = %self.path, "mkdir");
        self.channel.run_for_status(&format!("mkdir {}", self.path))
    }

    /// Removes this path, recursively and without confirmation.
    pub fn delete(&self) -> Result<bool, ChannelError> {
        tracing::trace!(path = %self.path, "delete");
        self.channel
            .run_for_status(&format!("rm -rf {}", self.path))
    }

    /// Moves this path to the destination handle's path.
    ///
    /// Neither handle's snapshot is updated; re-stat to observe the move.
    pub fn move_to(&self, destination: &ShellFile) -> Result<bool, ChannelError> {
        tracing::trace!(from = %self.path, to = %destination.path, "move");
        self.channel
            .run_for_status(&format!("mv {} {}", self.path, destination.path))
    }

    /// Lists this directory's children in the order the session emitted
    /// them.
    ///
    /// Lines that do not parse as listing records are silently skipped.
    pub fn list_files(&self) -> Result<Vec<ShellFile>, ChannelError> {
        self.list_files_with(ShellFile::new)
    }

    /// Lists children, building each one with the supplied constructor.
    ///
    /// The constructor receives the shared channel, the parsed entry and
    /// the child's absolute path, so specialized handle types produce
    /// children of their own kind.
    pub fn list_files_with<T>(
        &self,
        build: impl Fn(SharedChannel, LsEntry, String) -> T,
    ) -> Result<Vec<T>, ChannelError> {
        tracing::trace!(path = %self.path, "list_files");
        let output = self.channel.execute(&format!("ls -lA {}", self.path))?;

        let mut children = Vec::new();
        for line in &output.lines {
            if let Some(entry) = parse_line(line) {
                let child_path = format!("{}/{}", self.path, entry.name());
                children.push(build(Arc::clone(&self.channel), entry, child_path));
            }
        }
        tracing::trace!(path = %self.path, count = children.len(), "listing parsed");
        Ok(children)
    }

    /// Opens a readable byte stream for this path.
    ///
    /// `offset` is accepted for interface compatibility but not honored;
    /// reading always starts at the beginning of the file.
    pub fn create_input_stream(&self, offset: u64) -> Result<RestoringReader, StreamError> {
        tracing::trace!(path = %self.path, offset, "create_input_stream");
        if offset != 0 {
            tracing::debug!(path = %self.path, offset, "read offset ignored");
        }
        RestoringReader::open(Arc::clone(&self.channel), &self.path)
    }

    /// Opens a writable byte stream for this path, truncating or creating
    /// as needed.
    ///
    /// `offset` is accepted for interface compatibility but not honored;
    /// writing always starts at the beginning of the file.
    pub fn create_output_stream(&self, offset: u64) -> Result<RestoringWriter, StreamError> {
        tracing::trace!(path = %self.path, offset, "create_output_stream");
        if offset != 0 {
            tracing::debug!(path = %self.path, offset, "write offset ignored");
        }
        RestoringWriter::create(Arc::clone(&self.channel), &self.path, self.exists())
    }
}
