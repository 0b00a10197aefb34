//! Host scanning.
//!
//! [`FreeBsdScanner`] runs the pipeline for one host:
//!
//! 1. `uname` / `uname -r` to confirm FreeBSD
//! 2. `pkg version -v` for the installed package inventory
//! 3. `rm -f /tmp/vuln.db` then `pkg audit -F -r -f /tmp/vuln.db`
//! 4. correlation of advisories with the inventory
//! 5. CVE detail lookup and report assembly
//!
//! [`scan_servers`] runs it for many hosts and collects successes and
//! failures into a [`ScanReport`]. A failing host never stops the others.
//!
//! # Example
//!
//! ```no_run
//! use bsdaudit::checker::default_fetcher;
//! use bsdaudit::config::Config;
//! use bsdaudit::scanner::scan_servers;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let fetcher = default_fetcher(&config.cve_api)?;
//!     let report = scan_servers(&config, &config.servers, &fetcher, true).await;
//!     for host in &report.hosts {
//!         println!("{}: {} CVEs", host.server, host.vulnerabilities.len());
//!     }
//!     Ok(())
//! }
//! ```

mod freebsd;

pub use freebsd::{detect_freebsd, prepend_proxy_env, FreeBsdScanner, ScanOptions};

use futures::future::join_all;
use std::time::Duration;
use tracing::{error, info};

use crate::checker::CveDetailFetcher;
use crate::config::{Config, ServerConfig};
use crate::error::HostScanError;
use crate::model::{HostFailure, HostScanResult, ScanReport};
use crate::remote::executor_for;

/// Builds one scanner per server, each with its own executor.
pub fn scanners_for(config: &Config, servers: &[ServerConfig]) -> Vec<FreeBsdScanner> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let options = ScanOptions {
        http_proxy: config.http_proxy.clone(),
        ignore: config.ignore.clone(),
    };

    servers
        .iter()
        .map(|server| {
            FreeBsdScanner::new(
                server.clone(),
                executor_for(server, timeout),
                options.clone(),
            )
        })
        .collect()
}

/// Scans `servers` and gathers the outcome of each.
pub async fn scan_servers(
    config: &Config,
    servers: &[ServerConfig],
    fetcher: &dyn CveDetailFetcher,
    parallel: bool,
) -> ScanReport {
    let scanners = scanners_for(config, servers);
    run_scanners(&scanners, fetcher, parallel).await
}

/// Runs already-built scanners, concurrently or one after another.
pub async fn run_scanners(
    scanners: &[FreeBsdScanner],
    fetcher: &dyn CveDetailFetcher,
    parallel: bool,
) -> ScanReport {
    let outcomes = if parallel && scanners.len() > 1 {
        join_all(scanners.iter().map(|s| s.scan(fetcher))).await
    } else {
        let mut outcomes = Vec::with_capacity(scanners.len());
        for scanner in scanners {
            outcomes.push(scanner.scan(fetcher).await);
        }
        outcomes
    };

    collect_outcomes(outcomes)
}

fn collect_outcomes(outcomes: Vec<Result<HostScanResult, HostScanError>>) -> ScanReport {
    let mut hosts = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(result) => hosts.push(result),
            Err(err) => {
                error!("{}", err);
                failures.push(HostFailure {
                    server: err.server.clone(),
                    step: err.step.to_string(),
                    message: err.source.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = hosts.len(),
        failed = failures.len(),
        "Finished scanning"
    );
    ScanReport::new(hosts, failures)
}
