//! Long-lived interactive shell session with line-level command correlation.
//!
//! The session spawns one shell process (an elevation command such as `su`,
//! or a plain `/bin/sh` for unprivileged use) with piped stdin and stdout.
//! Piped stdio rather than a PTY is deliberate: a PTY would echo commands
//! and prompts back into the output stream and break the correlation
//! between a command and its lines.
//!
//! Each submitted command is followed by an `echo` of a unique end marker
//! and the shell's `$?`. A dedicated reader thread drains stdout into a
//! channel; [`ShellSession::submit`] collects every line up to the marker
//! as the command's ordered output and parses the exit code from the
//! marker line.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use thiserror::Error;
use uuid::Uuid;

use crate::channel::CommandOutput;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to spawn the shell process.
    #[error("failed to spawn shell session: {0}")]
    SpawnFailed(String),

    /// The shell process died or its output channel closed. Fatal: every
    /// file handle sharing this session becomes unusable.
    #[error("session unavailable: {0}")]
    Unavailable(String),

    /// The command string would desynchronize marker correlation.
    #[error("command must not contain newlines: {0:?}")]
    InvalidCommand(String),
}

/// One interactive shell session.
///
/// All submission goes through `&mut self`; callers wanting shared access
/// wrap the session in the command channel, which also enforces the
/// one-command-in-flight invariant.
pub struct ShellSession {
    /// The shell child process.
    child: Child,

    /// The shell's stdin.
    stdin: ChildStdin,

    /// Lines drained from the shell's stdout by the reader thread.
    lines: Receiver<String>,

    /// Cleared by the reader thread when stdout closes.
    running: Arc<AtomicBool>,
}

impl ShellSession {
    /// Spawns a new session running the given command.
    ///
    /// The child runs with `LC_ALL=C` so listing output keeps the column
    /// layout the parser expects. stderr is discarded; only stdout lines
    /// participate in command correlation.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, SessionError> {
        let mut child = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SessionError::SpawnFailed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::SpawnFailed("stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::SpawnFailed("stdout not captured".to_string()))?;

        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        thread::Builder::new()
            .name("shellfs-session-reader".to_string())
            .spawn(move || {
                let reader = BufReader::new(stdout);
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "error reading session output");
                            break;
                        }
                    }
                }
                flag.store(false, Ordering::SeqCst);
                tracing::debug!("session reader finished; shell stdout closed");
            })
            .map_err(|e| SessionError::SpawnFailed(e.to_string()))?;

        tracing::info!(program, "shell session spawned");
        Ok(Self {
            child,
            stdin,
            lines: rx,
            running,
        })
    }

    /// Whether the shell process is still usable.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs one command to completion, blocking until the session is idle.
    ///
    /// Returns every output line in emission order plus the exit code.
    /// Blocks indefinitely; there is no timeout at this layer.
    pub fn submit(&mut self, command: &str) -> Result<CommandOutput, SessionError> {
        if command.contains('\n') {
            return Err(SessionError::InvalidCommand(command.to_string()));
        }
        if !self.is_running() {
            return Err(SessionError::Unavailable(
                "shell process exited".to_string(),
            ));
        }

        let marker = format!("__SHELLFS_END_{}__", Uuid::new_v4().simple());
        tracing::trace!(command, "submitting command");

        writeln!(self.stdin, "{command}").map_err(write_failed)?;
        writeln!(self.stdin, "echo \"{marker} $?\"").map_err(write_failed)?;
        self.stdin.flush().map_err(write_failed)?;

        let mut lines = Vec::new();
        loop {
            let line = self.lines.recv().map_err(|_| {
                SessionError::Unavailable("output channel closed".to_string())
            })?;
            if let Some(rest) = line.strip_prefix(&marker) {
                let code = rest.trim().parse::<i32>().unwrap_or(-1);
                tracing::trace!(command, code, line_count = lines.len(), "command done");
                return Ok(CommandOutput { lines, code });
            }
            lines.push(line);
        }
    }

    /// Kills the shell process and reaps it.
    pub fn kill(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = self.child.kill() {
            tracing::debug!(error = %e, "kill on session child failed");
        }
        let _ = self.child.wait();
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        self.kill();
    }
}

fn write_failed(err: std::io::Error) -> SessionError {
    SessionError::Unavailable(format!("failed to write to shell stdin: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> ShellSession {
        ShellSession::spawn("/bin/sh", &[]).expect("failed to spawn /bin/sh")
    }

    #[test]
    fn test_submit_collects_output_lines() {
        let mut session = sh();
        let output = session.submit("echo hello").unwrap();
        assert_eq!(output.lines, vec!["hello".to_string()]);
        assert_eq!(output.code, 0);
    }

    #[test]
    fn test_submit_reports_nonzero_exit_code() {
        let mut session = sh();
        let output = session.submit("false").unwrap();
        assert!(output.lines.is_empty());
        assert_ne!(output.code, 0);
    }

    #[test]
    fn test_submit_preserves_line_order() {
        let mut session = sh();
        let output = session.submit("printf 'a\\nb\\nc\\n'").unwrap();
        assert_eq!(
            output.lines,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_sequential_commands_do_not_interleave() {
        let mut session = sh();
        let first = session.submit("echo one").unwrap();
        let second = session.submit("echo two").unwrap();
        assert_eq!(first.lines, vec!["one".to_string()]);
        assert_eq!(second.lines, vec!["two".to_string()]);
    }

    #[test]
    fn test_stderr_not_part_of_output() {
        let mut session = sh();
        let output = session.submit("echo visible; echo hidden >&2").unwrap();
        assert_eq!(output.lines, vec!["visible".to_string()]);
    }

    #[test]
    fn test_newline_in_command_rejected() {
        let mut session = sh();
        let result = session.submit("echo a\necho b");
        assert!(matches!(result, Err(SessionError::InvalidCommand(_))));
    }

    #[test]
    fn test_session_unavailable_after_shell_exit() {
        let mut session = sh();
        // The marker echo never runs once the shell exits, so this submit
        // already surfaces the failure.
        let result = session.submit("exit 0");
        assert!(matches!(result, Err(SessionError::Unavailable(_))));
        assert!(!session.is_running());

        let result = session.submit("echo still there");
        assert!(matches!(result, Err(SessionError::Unavailable(_))));
    }

    #[test]
    fn test_spawn_failure() {
        let result = ShellSession::spawn("/nonexistent/shell/binary", &[]);
        assert!(matches!(result, Err(SessionError::SpawnFailed(_))));
    }

    #[test]
    fn test_kill_marks_session_dead() {
        let mut session = sh();
        assert!(session.is_running());
        session.kill();
        assert!(!session.is_running());
    }
}
