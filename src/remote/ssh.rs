use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{run_command, ExecResult, Privilege, RemoteExecutor};
use crate::config::ServerConfig;
use crate::error::{Result, ScanError};

/// `ssh` reserves this status for its own failures (auth, connection).
const SSH_ERROR_STATUS: i32 = 255;

/// Runs commands through the system OpenSSH client.
///
/// Authentication is left to ssh itself: agent, `~/.ssh/config` or the
/// configured key. Batch mode makes a missing credential fail instead of
/// prompting.
pub struct SshExecutor {
    server: ServerConfig,
    timeout: Duration,
}

impl SshExecutor {
    pub fn new(server: ServerConfig, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    fn build_args(&self, remote_command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "LogLevel=quiet".to_string(),
            "-p".to_string(),
            self.server.port.to_string(),
        ];
        if let Some(key) = &self.server.key_path {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args.push(self.server.destination());
        args.push(remote_command.to_string());
        args
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute(&self, command: &str, privilege: Privilege) -> Result<ExecResult> {
        let remote_command = privilege.decorate(command);
        debug!(host = %self.server.host, command = %remote_command, "ssh");

        let mut cmd = Command::new("ssh");
        cmd.args(self.build_args(&remote_command));

        let result = run_command(cmd, &remote_command, self.timeout).await?;
        self.check_transport(remote_command, result)
    }
}

impl SshExecutor {
    /// Separates ssh's own failures from the remote command's exit status.
    fn check_transport(&self, remote_command: String, result: ExecResult) -> Result<ExecResult> {
        if result.exit_status == SSH_ERROR_STATUS {
            return Err(ScanError::Transport {
                command: remote_command,
                message: format!(
                    "ssh to {} failed: {}",
                    self.server.destination(),
                    result.stderr.trim()
                ),
            });
        }
        Ok(result)
    }
}
