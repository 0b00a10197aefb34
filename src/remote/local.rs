use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{run_command, ExecResult, Privilege, RemoteExecutor};
use crate::error::Result;

/// Runs commands on this machine through `/bin/sh`.
pub struct LocalExecutor {
    timeout: Duration,
}

impl LocalExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RemoteExecutor for LocalExecutor {
    async fn execute(&self, command: &str, privilege: Privilege) -> Result<ExecResult> {
        let command = privilege.decorate(command);
        debug!(command = %command, "local exec");

        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(&command);
        run_command(cmd, &command, self.timeout).await
    }
}
