use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DistroAdvisory, PackageRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vulnerability detail as supplied by the intelligence feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CveDetail {
    pub cve_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl CveDetail {
    pub fn new(cve_id: impl Into<String>) -> Self {
        Self {
            cve_id: cve_id.into(),
            summary: None,
            details: None,
            severity: Severity::Unknown,
            published: None,
            modified: None,
            references: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("No summary available")
    }
}

/// All we know about one CVE on one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub cve_id: String,
    pub detail: CveDetail,
    /// One entry per link, so a package reached through two advisories shows up twice.
    pub affected_packages: Vec<PackageRecord>,
    pub advisories: Vec<DistroAdvisory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distro {
    pub family: String,
    pub release: String,
}

impl std::fmt::Display for Distro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.release)
    }
}

/// Findings for a single successfully scanned host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostScanResult {
    pub server: String,
    pub distro: Distro,
    pub packages: Vec<PackageRecord>,
    pub vulnerabilities: Vec<ReportEntry>,
}

impl HostScanResult {
    pub fn outdated_count(&self) -> usize {
        self.packages.iter().filter(|p| p.is_outdated()).count()
    }
}

/// A host whose scan aborted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostFailure {
    pub server: String,
    pub step: String,
    pub message: String,
}

/// Results of one invocation across every configured host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_time: DateTime<Utc>,
    pub hosts: Vec<HostScanResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<HostFailure>,
}

impl ScanReport {
    pub fn new(hosts: Vec<HostScanResult>, failures: Vec<HostFailure>) -> Self {
        Self {
            scan_time: Utc::now(),
            hosts,
            failures,
        }
    }

    pub fn has_vulnerabilities(&self) -> bool {
        self.hosts.iter().any(|h| !h.vulnerabilities.is_empty())
    }
}
