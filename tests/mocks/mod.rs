//! Canned collaborators for driving a scan without a host or a network.

use async_trait::async_trait;
use bsdaudit::checker::CveDetailFetcher;
use bsdaudit::error::{Result, ScanError};
use bsdaudit::model::{CveDetail, Severity};
use bsdaudit::remote::{ExecResult, Privilege, RemoteExecutor};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Answers known commands with fixed output; anything else is a transport error.
pub struct MockExecutor {
    responses: HashMap<String, ExecResult>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn respond(mut self, command: &str, exit_status: i32, stdout: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            ExecResult {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_status,
            },
        );
        self
    }

    /// Commands received so far, in order.
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    async fn execute(&self, command: &str, _privilege: Privilege) -> Result<ExecResult> {
        self.log.lock().unwrap().push(command.to_string());
        self.responses
            .get(command)
            .cloned()
            .ok_or_else(|| ScanError::Transport {
                command: command.to_string(),
                message: "connection reset".to_string(),
            })
    }
}

/// Knows a fixed set of CVEs and records every lookup.
pub struct MockCveFetcher {
    known: Vec<String>,
    fail: bool,
    requests: Mutex<Vec<Vec<String>>>,
}

impl MockCveFetcher {
    pub fn with_known(ids: &[&str]) -> Self {
        Self {
            known: ids.iter().map(|id| id.to_string()).collect(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_known(&[])
        }
    }

    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CveDetailFetcher for MockCveFetcher {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_details(&self, cve_ids: &[String]) -> Result<Vec<CveDetail>> {
        self.requests.lock().unwrap().push(cve_ids.to_vec());
        if self.fail {
            return Err(ScanError::DetailLookup("feed unavailable".to_string()));
        }

        Ok(cve_ids
            .iter()
            .filter(|id| self.known.contains(id))
            .map(|id| {
                let mut detail = CveDetail::new(id.clone());
                detail.summary = Some(format!("Summary of {}", id));
                detail.severity = Severity::High;
                detail
            })
            .collect())
    }
}
