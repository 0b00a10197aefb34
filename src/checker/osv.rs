use crate::config::CveApiConfig;
use crate::error::{Result, ScanError};
use crate::model::{CveDetail, Severity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const TIMEOUT_SECONDS: u64 = 30;

/// Fetches CVE records from an OSV-compatible API (`GET /v1/vulns/{id}`).
pub struct OsvDetailClient {
    client: reqwest::Client,
    base_url: String,
    concurrency: usize,
}

impl OsvDetailClient {
    pub fn new(config: &CveApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECONDS))
            .user_agent(concat!("bsdaudit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            concurrency: config.concurrency.max(1),
        })
    }

    fn vuln_url(&self, cve_id: &str) -> String {
        format!("{}/v1/vulns/{}", self.base_url, cve_id)
    }

    async fn fetch_one(&self, cve_id: &str) -> Result<Option<CveDetail>> {
        let response = self.client.get(self.vuln_url(cve_id)).send().await?;
        if !has_record(response.status(), &self.base_url, cve_id)? {
            debug!(cve = cve_id, "No record in vulnerability feed");
            return Ok(None);
        }

        let vuln: OsvVuln = response.json().await?;
        Ok(Some(vuln.into_detail(cve_id)))
    }
}

/// `Ok(false)` when the feed has no record for the ID; any other non-success
/// status is a lookup failure.
fn has_record(status: StatusCode, base_url: &str, cve_id: &str) -> Result<bool> {
    if status == StatusCode::NOT_FOUND {
        return Ok(false);
    }
    if !status.is_success() {
        return Err(ScanError::DetailLookup(format!(
            "{} returned status {} for {}",
            base_url, status, cve_id
        )));
    }
    Ok(true)
}

#[derive(Deserialize)]
struct OsvVuln {
    id: String,
    summary: Option<String>,
    details: Option<String>,
    published: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
    severity: Option<Vec<OsvSeverity>>,
    references: Option<Vec<OsvReference>>,
}

#[derive(Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    severity_type: Option<String>,
    score: Option<String>,
}

#[derive(Deserialize)]
struct OsvReference {
    url: Option<String>,
}

impl OsvVuln {
    /// Keys the detail by the ID we asked for; the feed may answer under an alias.
    fn into_detail(self, requested_id: &str) -> CveDetail {
        if self.id != requested_id {
            debug!(requested = requested_id, returned = %self.id, "Feed answered with alias");
        }
        let severity = parse_severity(&self);
        CveDetail {
            cve_id: requested_id.to_string(),
            summary: self.summary,
            details: self.details,
            severity,
            published: self.published,
            modified: self.modified,
            references: self
                .references
                .unwrap_or_default()
                .into_iter()
                .filter_map(|r| r.url)
                .collect(),
        }
    }
}

#[async_trait]
impl super::CveDetailFetcher for OsvDetailClient {
    fn name(&self) -> &'static str {
        "OSV.dev"
    }

    async fn fetch_details(&self, cve_ids: &[String]) -> Result<Vec<CveDetail>> {
        let details: Vec<Option<CveDetail>> = stream::iter(cve_ids.to_vec())
            .map(|id| async move { self.fetch_one(&id).await })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(details.into_iter().flatten().collect())
    }
}

/// Parses CVSS score into a severity level.
///
/// Supports both numeric scores and CVSS vector strings.
pub fn parse_cvss_score(score: &str) -> Severity {
    if let Ok(cvss) = score.parse::<f32>() {
        return match cvss {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s > 0.0 => Severity::Low,
            _ => Severity::Unknown,
        };
    }

    // Vector strings carry no base score; go by the impact metrics
    if score.contains("CVSS:") {
        if score.contains("/C:H") || score.contains("/I:H") || score.contains("/A:H") {
            return Severity::High;
        }
        if score.contains("/C:L") || score.contains("/I:L") || score.contains("/A:L") {
            return Severity::Medium;
        }
        return Severity::Low;
    }

    Severity::Unknown
}

fn parse_severity(vuln: &OsvVuln) -> Severity {
    vuln.severity
        .iter()
        .flatten()
        .filter_map(|sev| sev.score.as_deref())
        .map(parse_cvss_score)
        .find(|s| *s != Severity::Unknown)
        .unwrap_or(Severity::Unknown)
}
