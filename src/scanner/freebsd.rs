use tracing::{debug, info, info_span, Instrument};

use crate::checker::CveDetailFetcher;
use crate::config::{IgnoreConfig, ServerConfig};
use crate::correlate::correlate;
use crate::error::{HostScanError, Result, ScanError, ScanStep};
use crate::model::{Distro, HostScanResult, Inventory, ReportEntry};
use crate::parser::{parse_pkg_audit, parse_pkg_version};
use crate::remote::{ExecResult, Privilege, RemoteExecutor};
use crate::report::{assemble_report, filter_ignored};

const VULNDB_PATH: &str = "/tmp/vuln.db";
const PKG_VERSION_CMD: &str = "pkg version -v";

/// Settings shared by every host in a run.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub http_proxy: Option<String>,
    pub ignore: IgnoreConfig,
}

/// Scans one FreeBSD host with `pkg version` and `pkg audit`.
///
/// Every call to [`scan`](Self::scan) builds its own inventory and index, so
/// one scanner per host can run concurrently with others.
pub struct FreeBsdScanner {
    server: ServerConfig,
    executor: Box<dyn RemoteExecutor>,
    options: ScanOptions,
}

impl FreeBsdScanner {
    pub fn new(
        server: ServerConfig,
        executor: Box<dyn RemoteExecutor>,
        options: ScanOptions,
    ) -> Self {
        Self {
            server,
            executor,
            options,
        }
    }

    /// Runs the full pipeline against the host.
    ///
    /// # Errors
    ///
    /// Any failure aborts the host: no partial result is returned. The error
    /// names the server and the step that failed.
    pub async fn scan(
        &self,
        fetcher: &dyn CveDetailFetcher,
    ) -> std::result::Result<HostScanResult, HostScanError> {
        let span = info_span!("host", server = %self.server.name);
        self.scan_inner(fetcher).instrument(span).await
    }

    async fn scan_inner(
        &self,
        fetcher: &dyn CveDetailFetcher,
    ) -> std::result::Result<HostScanResult, HostScanError> {
        let distro = detect_freebsd(self.executor.as_ref())
            .await
            .map_err(|e| self.fail(ScanStep::DetectOs, e))?;
        info!(distro = %distro, "Detected OS");

        let inventory = self
            .scan_installed_packages()
            .await
            .map_err(|e| self.fail(ScanStep::Inventory, e))?;
        info!(packages = inventory.len(), "Scanned installed packages");

        let vulnerabilities = self.scan_vulnerable_packages(&inventory, fetcher).await?;
        let vulnerabilities = filter_ignored(
            vulnerabilities,
            &self.server.ignore_cves,
            &self.options.ignore,
        );
        info!(cves = vulnerabilities.len(), "Scan finished");

        Ok(HostScanResult {
            server: self.server.name.clone(),
            distro,
            packages: inventory.into_packages(),
            vulnerabilities,
        })
    }

    async fn scan_installed_packages(&self) -> Result<Inventory> {
        let cmd = prepend_proxy_env(PKG_VERSION_CMD, self.options.http_proxy.as_deref());
        let result = self
            .executor
            .execute(&cmd, Privilege::NoSudo)
            .await?
            .expect_status(&cmd, &[0])?;
        Ok(Inventory::new(parse_pkg_version(&result.stdout)))
    }

    async fn scan_vulnerable_packages(
        &self,
        inventory: &Inventory,
        fetcher: &dyn CveDetailFetcher,
    ) -> std::result::Result<Vec<ReportEntry>, HostScanError> {
        let cleanup = format!("rm -f {}", VULNDB_PATH);
        self.run(&cleanup, &[0])
            .await
            .map_err(|e| self.fail(ScanStep::Cleanup, e))?;

        let audit = prepend_proxy_env(
            &format!("pkg audit -F -r -f {}", VULNDB_PATH),
            self.options.http_proxy.as_deref(),
        );
        let result = self
            .run(&audit, &[0, 1])
            .await
            .map_err(|e| self.fail(ScanStep::Audit, e))?;
        if result.exit_status == 0 {
            info!("pkg audit reported no vulnerabilities");
            return Ok(Vec::new());
        }

        let advisories = parse_pkg_audit(&result.stdout);
        debug!(advisories = advisories.len(), "Parsed pkg audit output");

        let index =
            correlate(inventory, &advisories).map_err(|e| self.fail(ScanStep::Correlate, e))?;
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let details = fetcher
            .fetch_details(index.cve_ids())
            .await
            .map_err(|e| self.fail(ScanStep::FetchDetails, e))?;
        info!(
            requested = index.len(),
            resolved = details.len(),
            feed = fetcher.name(),
            "Fetched CVE details"
        );

        Ok(assemble_report(&index, details))
    }

    async fn run(&self, cmd: &str, expected: &[i32]) -> Result<ExecResult> {
        self.executor
            .execute(cmd, Privilege::NoSudo)
            .await?
            .expect_status(cmd, expected)
    }

    fn fail(&self, step: ScanStep, source: ScanError) -> HostScanError {
        HostScanError::new(self.server.name.clone(), step, source)
    }
}

/// Confirms the host runs FreeBSD and reads its release.
pub async fn detect_freebsd(executor: &dyn RemoteExecutor) -> Result<Distro> {
    let uname = executor.execute("uname", Privilege::NoSudo).await?;
    if !uname.is_success(&[0]) || !uname.stdout.contains("FreeBSD") {
        return Err(ScanError::UnsupportedOs {
            detail: format!("uname reported `{}`", uname.stdout.trim()),
        });
    }

    let release = executor
        .execute("uname -r", Privilege::NoSudo)
        .await?
        .expect_status("uname -r", &[0])?;

    Ok(Distro {
        family: "FreeBSD".to_string(),
        release: release.stdout.trim().to_string(),
    })
}

/// Exports the proxy to commands that reach the network.
pub fn prepend_proxy_env(cmd: &str, http_proxy: Option<&str>) -> String {
    match http_proxy {
        Some(proxy) if !proxy.is_empty() => format!(
            r#"http_proxy="{p}" https_proxy="{p}" HTTP_PROXY="{p}" HTTPS_PROXY="{p}" {cmd}"#,
            p = proxy,
            cmd = cmd
        ),
        _ => cmd.to_string(),
    }
}
