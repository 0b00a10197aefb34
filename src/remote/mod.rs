//! Command execution on scanned hosts.
//!
//! The scanner only needs to run a handful of shell commands and read their
//! stdout and exit status. [`RemoteExecutor`] is that seam: [`SshExecutor`]
//! goes through the system `ssh` client, [`LocalExecutor`] runs commands on
//! this machine, and tests plug in canned responses.

mod local;
mod ssh;

pub use local::LocalExecutor;
pub use ssh::SshExecutor;

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::ServerConfig;
use crate::error::{Result, ScanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    NoSudo,
    Sudo,
}

impl Privilege {
    fn decorate(self, command: &str) -> String {
        match self {
            Privilege::NoSudo => command.to_string(),
            Privilege::Sudo => format!("sudo -S {}", command),
        }
    }
}

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl ExecResult {
    /// True if the exit status is one of `expected`, or 0 when `expected` is empty.
    pub fn is_success(&self, expected: &[i32]) -> bool {
        if expected.is_empty() {
            return self.exit_status == 0;
        }
        expected.contains(&self.exit_status)
    }

    /// Turns an unexpected exit status into an error.
    pub fn expect_status(self, command: &str, expected: &[i32]) -> Result<Self> {
        if self.is_success(expected) {
            Ok(self)
        } else {
            Err(ScanError::UnexpectedExitStatus {
                command: command.to_string(),
                status: self.exit_status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Runs `command` on the target host.
    ///
    /// # Errors
    ///
    /// Fails only when the command could not be run at all. A non-zero exit
    /// status is a normal [`ExecResult`]; callers decide which ones they accept.
    async fn execute(&self, command: &str, privilege: Privilege) -> Result<ExecResult>;
}

/// Picks the executor for a configured server.
pub fn executor_for(server: &ServerConfig, timeout: Duration) -> Box<dyn RemoteExecutor> {
    if server.is_local() {
        Box::new(LocalExecutor::new(timeout))
    } else {
        Box::new(SshExecutor::new(server.clone(), timeout))
    }
}

/// Spawns `cmd`, waits at most `timeout`, and collects its output.
async fn run_command(mut cmd: Command, display: &str, timeout: Duration) -> Result<ExecResult> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| ScanError::Timeout {
            command: display.to_string(),
            secs: timeout.as_secs(),
        })?
        .map_err(|err| ScanError::Transport {
            command: display.to_string(),
            message: err.to_string(),
        })?;

    // Killed by a signal: no status to report.
    let exit_status = output.status.code().ok_or_else(|| ScanError::Transport {
        command: display.to_string(),
        message: "terminated by signal".to_string(),
    })?;

    Ok(ExecResult {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_status,
    })
}
