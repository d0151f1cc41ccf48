//! Privileged shell session management.
//!
//! A session is one long-lived elevated shell process through which every
//! filesystem operation is indirected. The session itself knows nothing
//! about files; it runs command strings and reports their output lines and
//! exit codes.

pub mod shell;

pub use shell::{SessionError, ShellSession};
