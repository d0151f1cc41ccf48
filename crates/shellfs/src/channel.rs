//! Command channel: the synchronization and correlation layer between file
//! handles and the privileged session.
//!
//! The channel contract is synchronous from the caller's point of view:
//! [`CommandChannel::execute`] blocks until the session has run the command
//! to completion, and no two commands ever have interleaved output. The
//! production implementation serializes callers with a mutex; a fake
//! implementation can script responses for tests.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::session::{SessionError, ShellSession};

/// Errors surfaced by the command channel.
///
/// A command that ran but exited non-zero is not an error here; that is a
/// `false` status the caller must check. An `Err` means the privileged
/// session itself is gone, which is fatal for every handle sharing it.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The privileged session is unreachable.
    #[error("privileged session unavailable: {0}")]
    SessionUnavailable(String),
}

impl From<SessionError> for ChannelError {
    fn from(err: SessionError) -> Self {
        ChannelError::SessionUnavailable(err.to_string())
    }
}

/// The complete output of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Output lines in the order the session emitted them.
    pub lines: Vec<String>,
    /// Numeric result code.
    pub code: i32,
}

impl CommandOutput {
    /// Whether the command reported success.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Shared handle to a command channel.
///
/// Every file handle in a tree holds one of these; the channel outlives any
/// single handle and is always passed in explicitly, never reached through
/// a global.
pub type SharedChannel = Arc<dyn CommandChannel>;

/// Submits commands to the privileged session and correlates their output.
pub trait CommandChannel: Send + Sync {
    /// Runs one command to completion.
    ///
    /// Blocks the calling thread until the session reports idle. Output
    /// lines are returned in emission order together with the result code.
    fn execute(&self, command: &str) -> Result<CommandOutput, ChannelError>;

    /// Runs a command for its status alone: `true` iff the code was zero.
    ///
    /// Used for mutating operations (mkdir, delete, move, chmod).
    fn run_for_status(&self, command: &str) -> Result<bool, ChannelError> {
        Ok(self.execute(command)?.success())
    }

    /// Runs a command and concatenates its output lines.
    ///
    /// Returns the empty string when the command produced no output. Used
    /// for single-value queries such as `stat -c %a`.
    fn run_for_output(&self, command: &str) -> Result<String, ChannelError> {
        let output = self.execute(command)?;
        tracing::trace!(command, output = %output.lines.concat(), "read command output");
        Ok(output.lines.concat())
    }
}

/// Production channel backed by one [`ShellSession`].
///
/// The mutex is the "at most one command in flight" invariant: handles used
/// concurrently from different callers serialize here.
pub struct ShellChannel {
    session: Mutex<ShellSession>,
}

impl ShellChannel {
    /// Wraps a session in a channel.
    pub fn new(session: ShellSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Wraps a session in a shared channel handle.
    pub fn shared(session: ShellSession) -> SharedChannel {
        Arc::new(Self::new(session))
    }
}

impl CommandChannel for ShellChannel {
    fn execute(&self, command: &str) -> Result<CommandOutput, ChannelError> {
        let mut session = self.session.lock().map_err(|_| {
            ChannelError::SessionUnavailable("session mutex poisoned".to_string())
        })?;
        Ok(session.submit(command)?)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeChannel;
    use super::*;

    #[test]
    fn test_run_for_status_true_on_zero_code() {
        let channel = FakeChannel::new();
        channel.respond("mkdir /data/new", &[], 0);
        assert!(channel.run_for_status("mkdir /data/new").unwrap());
    }

    #[test]
    fn test_run_for_status_false_mirrors_nonzero_code() {
        let channel = FakeChannel::new();
        channel.fail("mkdir /data/denied", 1);
        assert!(!channel.run_for_status("mkdir /data/denied").unwrap());
        // A different command string is unaffected.
        assert!(channel.run_for_status("mkdir /data/other").unwrap());
    }

    #[test]
    fn test_run_for_output_concatenates_lines() {
        let channel = FakeChannel::new();
        channel.respond("stat -c %a /data/f", &["640"], 0);
        assert_eq!(channel.run_for_output("stat -c %a /data/f").unwrap(), "640");
    }

    #[test]
    fn test_run_for_output_empty_when_no_output() {
        let channel = FakeChannel::new();
        assert_eq!(channel.run_for_output("true").unwrap(), "");
    }

    #[test]
    fn test_unavailable_propagates_as_error() {
        let channel = FakeChannel::new();
        channel.set_unavailable();
        assert!(matches!(
            channel.execute("ls -lA /"),
            Err(ChannelError::SessionUnavailable(_))
        ));
        assert!(channel.run_for_status("mkdir /x").is_err());
        assert!(channel.run_for_output("stat -c %a /x").is_err());
    }

    #[test]
    fn test_fake_records_commands_in_order() {
        let channel = FakeChannel::new();
        channel.execute("first").unwrap();
        channel.execute("second").unwrap();
        assert_eq!(
            channel.commands(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn test_shell_channel_executes_against_real_shell() {
        let session = ShellSession::spawn("/bin/sh", &[]).unwrap();
        let channel = ShellChannel::new(session);
        let output = channel.execute("echo via-channel").unwrap();
        assert_eq!(output.lines, vec!["via-channel".to_string()]);
        assert!(output.success());
    }

    #[test]
    fn test_shell_channel_serializes_commands() {
        let session = ShellSession::spawn("/bin/sh", &[]).unwrap();
        let channel = ShellChannel::shared(session);
        let first = channel.execute("echo a").unwrap();
        let second = channel.execute("echo b").unwrap();
        assert_eq!(first.lines, vec!["a".to_string()]);
        assert_eq!(second.lines, vec!["b".to_string()]);
    }

    #[test]
    fn test_shell_channel_status_helpers() {
        let session = ShellSession::spawn("/bin/sh", &[]).unwrap();
        let channel = ShellChannel::new(session);
        assert!(channel.run_for_status("true").unwrap());
        assert!(!channel.run_for_status("false").unwrap());
    }
}
