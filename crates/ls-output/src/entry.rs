//! Typed metadata for one listing entry.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Kind of entry a listing line described.
///
/// Anything that is not a directory is exposed as a plain file; symlink,
/// device and socket semantics are out of scope for the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A directory.
    Directory,
    /// A regular file (or anything treated as one).
    File,
}

/// One parsed directory-listing entry.
///
/// An `LsEntry` is an immutable snapshot taken at parse time, not a live
/// view of the filesystem. `kind` being `None` means the path was queried
/// but not found; an existing entry is exactly one of directory or file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LsEntry {
    /// Entry base name, unique within its parent listing.
    name: String,
    /// Entry kind; `None` for a path that does not exist.
    kind: Option<EntryKind>,
    /// Size in bytes. Meaningless for directories.
    size: u64,
    /// Last modification time.
    modified: SystemTime,
}

impl LsEntry {
    /// Creates a directory entry.
    pub fn directory(name: impl Into<String>, size: u64, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            kind: Some(EntryKind::Directory),
            size,
            modified,
        }
    }

    /// Creates a regular-file entry.
    pub fn file(name: impl Into<String>, size: u64, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            kind: Some(EntryKind::File),
            size,
            modified,
        }
    }

    /// Creates an entry for a path that was queried but not found.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    /// Returns the entry's base name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry kind, or `None` when the entry does not exist.
    pub fn kind(&self) -> Option<EntryKind> {
        self.kind
    }

    /// Whether the entry exists.
    pub fn exists(&self) -> bool {
        self.kind.is_some()
    }

    /// Whether the entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == Some(EntryKind::Directory)
    }

    /// Whether the entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == Some(EntryKind::File)
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stamp(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_directory_entry() {
        let entry = LsEntry::directory("sub", 4096, stamp(1_700_000_000));
        assert_eq!(entry.name(), "sub");
        assert!(entry.exists());
        assert!(entry.is_directory());
        assert!(!entry.is_file());
        assert_eq!(entry.size(), 4096);
        assert_eq!(entry.modified(), stamp(1_700_000_000));
    }

    #[test]
    fn test_file_entry() {
        let entry = LsEntry::file("file.txt", 123, stamp(1_700_000_000));
        assert!(entry.exists());
        assert!(entry.is_file());
        assert!(!entry.is_directory());
        assert_eq!(entry.kind(), Some(EntryKind::File));
    }

    #[test]
    fn test_missing_entry() {
        let entry = LsEntry::missing("ghost");
        assert_eq!(entry.name(), "ghost");
        assert!(!entry.exists());
        assert!(!entry.is_directory());
        assert!(!entry.is_file());
        assert_eq!(entry.kind(), None);
        assert_eq!(entry.size(), 0);
        assert_eq!(entry.modified(), SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn test_exactly_one_kind_when_existing() {
        let dir = LsEntry::directory("d", 0, stamp(0));
        let file = LsEntry::file("f", 0, stamp(0));
        assert!(dir.is_directory() ^ dir.is_file() || !dir.exists());
        assert!(file.is_directory() ^ file.is_file());
    }

    #[test]
    fn test_serde_roundtrip() {
        let entry = LsEntry::file("data.bin", 42, stamp(1_704_067_200));
        let json = serde_json::to_string(&entry).unwrap();
        let restored: LsEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, entry);
    }

    #[test]
    fn test_kind_serialization_is_lowercase() {
        let json = serde_json::to_string(&EntryKind::Directory).unwrap();
        assert_eq!(json, "\"directory\"");
    }
}
