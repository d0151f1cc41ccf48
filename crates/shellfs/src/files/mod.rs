//! File handles and permission-preserving streams.
//!
//! This module is the filesystem surface a file-serving front end consumes:
//! - [`ShellFile`]: an immutable snapshot of one filesystem entry plus the
//!   operations to act on it through the shared command channel
//! - [`RestoringReader`] / [`RestoringWriter`]: raw byte streams whose
//!   lifetimes are bracketed by a save / relax / restore of the target's
//!   mode bits

pub mod handle;
pub mod stream;

pub use handle::ShellFile;
pub use stream::{RestoringReader, RestoringWriter, StreamError};
