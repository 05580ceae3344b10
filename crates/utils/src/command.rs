//! Helpers intended for [`std::process::Command`] and related structures.

use std::os::unix::process::ExitStatusExt as _;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

/// How a child process's standard input is connected.
///
/// Standard output and standard error are always inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdin {
    /// Connect standard input to `/dev/null`.
    Null,
    /// Share our standard input with the child, e.g. for interactive shells.
    Inherit,
}

impl From<Stdin> for Stdio {
    fn from(value: Stdin) -> Self {
        match value {
            Stdin::Null => Stdio::null(),
            Stdin::Inherit => Stdio::inherit(),
        }
    }
}

/// A child process ran but exited unsuccessfully.
///
/// This is kept distinct from other errors so that the top level
/// can exit with the same code as the child.
#[derive(Debug, thiserror::Error)]
#[error("{program} failed with exit code {code}")]
pub struct ExitCodeError {
    /// The program that was executed
    pub program: String,
    /// The exit code; termination by signal N is reported as 128+N
    pub code: i32,
}

/// Find the exit code of a failed child process anywhere in the error chain.
pub fn child_exit_code(err: &anyhow::Error) -> Option<i32> {
    err.chain()
        .find_map(|e| e.downcast_ref::<ExitCodeError>())
        .map(|e| e.code)
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

fn quote(s: &str) -> String {
    shlex::try_quote(s)
        .map(|q| q.into_owned())
        .unwrap_or_else(|_| s.to_owned())
}

/// Helpers intended for [`std::process::Command`].
pub trait CommandRunExt {
    /// Synchronously execute the child with stdout and stderr inherited,
    /// and stdin connected as requested. A non-zero exit is returned as
    /// an [`ExitCodeError`].
    fn run_sync(&mut self, stdin: Stdin) -> Result<()>;

    /// Render the command line with shell quoting, suitable for logs.
    fn to_string_pretty(&self) -> String;
}

impl CommandRunExt for Command {
    fn run_sync(&mut self, stdin: Stdin) -> Result<()> {
        let program = self.get_program().to_string_lossy().into_owned();
        self.stdin(stdin)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        tracing::debug!("exec: {}", self.to_string_pretty());
        let status = self
            .status()
            .with_context(|| format!("Failed to spawn {program}"))?;
        if status.success() {
            return Ok(());
        }
        Err(ExitCodeError {
            program,
            code: exit_code(status),
        }
        .into())
    }

    fn to_string_pretty(&self) -> String {
        std::iter::once(self.get_program())
            .chain(self.get_args())
            .map(|a| quote(&a.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        Command::new("true").run_sync(Stdin::Null).unwrap();
    }

    #[test]
    fn test_run_exit_code() {
        let e = Command::new("sh")
            .args(["-c", "exit 7"])
            .run_sync(Stdin::Null)
            .unwrap_err();
        assert_eq!(child_exit_code(&e), Some(7));
        assert_eq!(e.to_string(), "sh failed with exit code 7");

        // The code survives added context
        let e = e.context("Running helper");
        assert_eq!(child_exit_code(&e), Some(7));
    }

    #[test]
    fn test_run_signal() {
        let e = Command::new("sh")
            .args(["-c", "kill -9 $$"])
            .run_sync(Stdin::Null)
            .unwrap_err();
        assert_eq!(child_exit_code(&e), Some(128 + 9));
    }

    #[test]
    fn test_spawn_failure() {
        let e = Command::new("/nonexistent/osbuildbootc-test-binary")
            .run_sync(Stdin::Null)
            .unwrap_err();
        assert_eq!(child_exit_code(&e), None);
        assert!(e.to_string().starts_with("Failed to spawn"));
    }

    #[test]
    fn test_stdin_null() {
        // `read` fails at EOF, which is what /dev/null gives us
        let e = Command::new("sh")
            .args(["-c", "read x"])
            .run_sync(Stdin::Null)
            .unwrap_err();
        assert_eq!(child_exit_code(&e), Some(1));
    }

    #[test]
    fn test_to_string_pretty() {
        let mut c = Command::new("qemu-img");
        c.args(["create", "-f", "qcow2", "my disk.qcow2", "10240M"]);
        similar_asserts::assert_eq!(
            c.to_string_pretty(),
            "qemu-img create -f qcow2 'my disk.qcow2' 10240M"
        );
    }
}
