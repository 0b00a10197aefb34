//! Error types for host scans.
//!
//! [`ScanError`] is what each pipeline step fails with. [`HostScanError`]
//! wraps it with the server name and the step that failed, so a caller
//! scanning many hosts can report one and carry on with the rest.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The command never ran to completion (spawn failure, connection lost).
    #[error("Failed to execute `{command}`: {message}")]
    Transport { command: String, message: String },

    #[error("Command `{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("Command `{command}` exited with status {status}: {stderr}")]
    UnexpectedExitStatus {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Not a FreeBSD host: {detail}")]
    UnsupportedOs { detail: String },

    /// `pkg audit` named a package that `pkg version` did not list.
    #[error("Vulnerable package {name} is not found in the installed package list")]
    PackageNotInInventory { name: String },

    #[error("Vulnerability detail lookup failed: {0}")]
    DetailLookup(String),
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::DetailLookup(err.to_string())
    }
}

/// Pipeline stage a host scan was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    DetectOs,
    Inventory,
    Cleanup,
    Audit,
    Correlate,
    FetchDetails,
}

impl ScanStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStep::DetectOs => "OS detection",
            ScanStep::Inventory => "package inventory",
            ScanStep::Cleanup => "audit database cleanup",
            ScanStep::Audit => "pkg audit",
            ScanStep::Correlate => "advisory correlation",
            ScanStep::FetchDetails => "CVE detail lookup",
        }
    }
}

impl std::fmt::Display for ScanStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("[{server}] {step} failed: {source}")]
pub struct HostScanError {
    pub server: String,
    pub step: ScanStep,
    #[source]
    pub source: ScanError,
}

impl HostScanError {
    pub fn new(server: impl Into<String>, step: ScanStep, source: ScanError) -> Self {
        Self {
            server: server.into(),
            step,
            source,
        }
    }
}
