//! # ShellFS
//!
//! A filesystem provider whose operations are not performed through direct
//! OS filesystem calls but by shelling privileged commands out to a single
//! long-lived interactive session.
//!
//! ## Overview
//!
//! A file-serving front end (an FTP/SFTP-style server, say) can expose
//! parts of a filesystem it lacks permission to touch directly by routing
//! every operation — list, create, delete, move, read, write — through an
//! elevated shell session and translating the textual command output back
//! into structured metadata.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                File-serving front end                   │
//! ├─────────────────────────────────────────────────────────┤
//! │  ShellFile handles        RestoringReader / Writer      │
//! │  (list, mkdir, delete,    (mode save / relax / restore  │
//! │   move, metadata)          around raw byte streams)     │
//! ├─────────────────────────────────────────────────────────┤
//! │              CommandChannel (one in flight)             │
//! ├─────────────────────────────────────────────────────────┤
//! │        ShellSession (long-lived elevated shell)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shellfs::{Config, ShellChannel, ShellFile, ShellSession};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     config.validate()?;
//!
//!     let session = ShellSession::spawn(&config.session.command, &config.session.args)?;
//!     let channel = ShellChannel::shared(session);
//!
//!     let root = ShellFile::missing(channel, "/data/app".to_string());
//!     for child in root.list_files()? {
//!         println!("{} ({} bytes)", child.name(), child.size());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`session`]: The privileged shell session
//! - [`channel`]: Command submission and output correlation
//! - [`files`]: File handles and permission-preserving streams

pub mod channel;
pub mod config;
pub mod files;
pub mod session;

// Re-export the listing crate for convenience
pub use ls_output;

// Re-export config types for convenience
pub use config::{Config, ConfigError};

// Re-export session types for convenience
pub use session::{SessionError, ShellSession};

// Re-export channel types for convenience
pub use channel::{ChannelError, CommandChannel, CommandOutput, SharedChannel, ShellChannel};

// Re-export files types for convenience
pub use files::{RestoringReader, RestoringWriter, ShellFile, StreamError};
