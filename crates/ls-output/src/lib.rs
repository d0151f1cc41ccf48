//! # ls-output
//!
//! This crate turns the text stream of a long-format directory listing
//! (`ls -lA`) into typed entry metadata.
//!
//! It is the foundation the shellfs provider builds on: the provider runs
//! listing commands through a privileged shell session and feeds every
//! output line through [`parse_line`], collecting the [`LsEntry`] records
//! that come back.
//!
//! ## Contract
//!
//! - [`parse_line`] accepts one line and returns `Some(LsEntry)` when the
//!   line is shaped like a listing record, `None` otherwise. Blank lines,
//!   `total N` headers and anything malformed are skipped, never errors.
//! - [`LsEntry`] is a point-in-time snapshot: name, kind, size and
//!   modification timestamp. An entry either exists as exactly one of
//!   directory or regular file, or does not exist at all.
//!
//! ## Modules
//!
//! - [`entry`]: the typed listing record
//! - [`parser`]: line-level parsing

pub mod entry;
pub mod parser;

pub use entry::{EntryKind, LsEntry};
pub use parser::parse_line;
