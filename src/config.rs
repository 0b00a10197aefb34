//! Configuration file handling.
//!
//! The configuration lists the hosts to scan and how to reach the CVE feed.
//! It is stored as TOML at:
//! - Linux / FreeBSD: `~/.config/bsdaudit/config.toml`
//! - macOS: `~/Library/Application Support/bsdaudit/config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! default_format = "table"
//! timeout_secs = 300
//! http_proxy = "http://proxy.example.com:3128"
//!
//! [cve_api]
//! base_url = "https://api.osv.dev"
//! concurrency = 8
//!
//! [[servers]]
//! name = "web01"
//! host = "192.0.2.10"
//! port = 22
//! user = "audit"
//! key_path = "/home/audit/.ssh/id_ed25519"
//! ignore_cves = ["CVE-2016-0001"]
//!
//! [[servers]]
//! name = "self"
//! host = "localhost"
//!
//! [ignore]
//! packages = ["py27-*"]
//! vulnerabilities = ["CVE-2016-2177"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output format when no `--format` flag is given: "table" or "json".
    pub default_format: String,

    /// Upper bound for a single remote command, in seconds.
    ///
    /// `pkg audit -F` downloads the vulnerability database, so keep this generous.
    pub timeout_secs: u64,

    /// Proxy exported to `pkg` on the scanned hosts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,

    pub cve_api: CveApiConfig,

    pub servers: Vec<ServerConfig>,

    /// Ignore list for suppressing known issues.
    pub ignore: IgnoreConfig,
}

/// Where CVE detail is fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CveApiConfig {
    /// Base URL of an OSV-compatible API.
    pub base_url: String,

    /// Number of detail requests kept in flight.
    pub concurrency: usize,
}

impl Default for CveApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.osv.dev".to_string(),
            concurrency: 8,
        }
    }
}

/// A host to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,
    /// CVEs to drop from this server's report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_cves: Vec<String>,
}

fn default_ssh_port() -> u16 {
    22
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_ssh_port(),
            user: None,
            key_path: None,
            ignore_cves: Vec::new(),
        }
    }

    /// Local hosts are scanned without going through ssh.
    pub fn is_local(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1")
    }

    /// `user@host`, or just the host when no user is configured.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

/// Configuration for ignoring specific packages or vulnerabilities.
///
/// Use this to suppress known false positives or accepted risks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Package names to leave out of findings.
    ///
    /// Supports glob patterns (e.g., "py27-*", "*-devel").
    pub packages: Vec<String>,

    /// CVE IDs to ignore on every server.
    pub vulnerabilities: Vec<String>,
}

impl IgnoreConfig {
    /// Check if a package should be ignored.
    pub fn should_ignore_package(&self, name: &str) -> bool {
        self.packages.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }

    /// Check if a vulnerability should be ignored.
    pub fn should_ignore_vulnerability(&self, cve_id: &str) -> bool {
        self.vulnerabilities.iter().any(|id| id == cve_id)
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Check prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Check suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: "table".to_string(),
            timeout_secs: 300,
            http_proxy: None,
            cve_api: CveApiConfig::default(),
            servers: Vec::new(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`, falling back to defaults if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Saves the configuration to `path`, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bsdaudit")
            .join("config.toml")
    }

    pub fn find_server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|s| s.name == name)
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
