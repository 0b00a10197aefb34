mod mocks;

use bsdaudit::config::{IgnoreConfig, ServerConfig};
use bsdaudit::error::{ScanError, ScanStep};
use bsdaudit::model::Severity;
use bsdaudit::scanner::{detect_freebsd, run_scanners, FreeBsdScanner, ScanOptions};
use mocks::{MockCveFetcher, MockExecutor};

const PKG_VERSION: &str = "\
nginx-1.10.1                       =   up-to-date with index
openssl-1.0.1                      <   needs updating (index has 1.0.2)
curl-7.50.0                        ?   orphaned: ftp/curl
";

const AUDIT_SHARED_CVE: &str = "\
nginx-1.10.1 is vulnerable:
nginx -- multiple issues
CVE: CVE-2016-0001
WWW: https://vuxml.freebsd.org/freebsd/abc123.html

openssl-1.0.1 is vulnerable:
OpenSSL -- multiple vulnerabilities
CVE: CVE-2016-0001
CVE: CVE-2016-0002
WWW: https://vuxml.freebsd.org/freebsd/def456.html

2 problem(s) in 2 installed package(s) found.
";

fn freebsd_host() -> MockExecutor {
    MockExecutor::new()
        .respond("uname", 0, "FreeBSD\n")
        .respond("uname -r", 0, "10.3-RELEASE\n")
        .respond("pkg version -v", 0, PKG_VERSION)
        .respond("rm -f /tmp/vuln.db", 0, "")
}

fn scanner(executor: MockExecutor, options: ScanOptions) -> FreeBsdScanner {
    FreeBsdScanner::new(
        ServerConfig::new("web01", "192.0.2.10"),
        Box::new(executor),
        options,
    )
}

#[tokio::test]
async fn test_shared_cve_produces_one_entry() {
    let executor = freebsd_host().respond("pkg audit -F -r -f /tmp/vuln.db", 1, AUDIT_SHARED_CVE);
    let fetcher = MockCveFetcher::with_known(&["CVE-2016-0001", "CVE-2016-0002"]);

    let result = scanner(executor, ScanOptions::default())
        .scan(&fetcher)
        .await
        .unwrap();

    assert_eq!(result.server, "web01");
    assert_eq!(result.distro.release, "10.3-RELEASE");
    assert_eq!(result.packages.len(), 3);
    assert_eq!(result.vulnerabilities.len(), 2);

    let shared = &result.vulnerabilities[0];
    assert_eq!(shared.cve_id, "CVE-2016-0001");
    let names: Vec<&str> = shared
        .affected_packages
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["nginx", "openssl"]);
    let advisories: Vec<&str> = shared
        .advisories
        .iter()
        .map(|a| a.advisory_id.as_str())
        .collect();
    assert_eq!(advisories, vec!["abc123", "def456"]);
    assert_eq!(shared.detail.severity, Severity::High);

    let openssl_only = &result.vulnerabilities[1];
    assert_eq!(openssl_only.cve_id, "CVE-2016-0002");
    assert_eq!(
        openssl_only.affected_packages[0].candidate_version.as_deref(),
        Some("1.0.2")
    );

    assert_eq!(
        fetcher.requests(),
        vec![vec!["CVE-2016-0001".to_string(), "CVE-2016-0002".to_string()]]
    );
}

#[tokio::test]
async fn test_audit_clean_skips_lookup() {
    let executor = freebsd_host().respond(
        "pkg audit -F -r -f /tmp/vuln.db",
        0,
        "0 problem(s) in 0 installed package(s) found.\n",
    );
    let fetcher = MockCveFetcher::with_known(&["CVE-2016-0001"]);

    let result = scanner(executor, ScanOptions::default())
        .scan(&fetcher)
        .await
        .unwrap();

    assert!(result.vulnerabilities.is_empty());
    assert_eq!(result.packages.len(), 3);
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_partial_detail_is_omitted() {
    let executor = freebsd_host().respond("pkg audit -F -r -f /tmp/vuln.db", 1, AUDIT_SHARED_CVE);
    let fetcher = MockCveFetcher::with_known(&["CVE-2016-0002"]);

    let result = scanner(executor, ScanOptions::default())
        .scan(&fetcher)
        .await
        .unwrap();

    assert_eq!(result.vulnerabilities.len(), 1);
    assert_eq!(result.vulnerabilities[0].cve_id, "CVE-2016-0002");
}

#[tokio::test]
async fn test_unknown_package_aborts_host() {
    let audit = "\
apache24-2.4.20 is vulnerable:
CVE: CVE-2016-5387
WWW: https://vuxml.freebsd.org/freebsd/cf0b5668.html
";
    let executor = freebsd_host().respond("pkg audit -F -r -f /tmp/vuln.db", 1, audit);
    let fetcher = MockCveFetcher::with_known(&["CVE-2016-5387"]);

    let err = scanner(executor, ScanOptions::default())
        .scan(&fetcher)
        .await
        .unwrap_err();

    assert_eq!(err.server, "web01");
    assert_eq!(err.step, ScanStep::Correlate);
    assert!(matches!(
        err.source,
        ScanError::PackageNotInInventory { ref name } if name == "apache24"
    ));
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_unexpected_audit_status_is_fatal() {
    let executor = freebsd_host().respond("pkg audit -F -r -f /tmp/vuln.db", 3, "");
    let fetcher = MockCveFetcher::with_known(&[]);

    let err = scanner(executor, ScanOptions::default())
        .scan(&fetcher)
        .await
        .unwrap_err();

    assert_eq!(err.step, ScanStep::Audit);
    assert!(matches!(
        err.source,
        ScanError::UnexpectedExitStatus { status: 3, .. }
    ));
}

#[tokio::test]
async fn test_transport_failure_is_fatal() {
    // No canned response for `pkg version -v` makes the mock fail as a transport error.
    let executor = MockExecutor::new()
        .respond("uname", 0, "FreeBSD\n")
        .respond("uname -r", 0, "11.0-RELEASE\n");
    let fetcher = MockCveFetcher::with_known(&[]);

    let err = scanner(executor, ScanOptions::default())
        .scan(&fetcher)
        .await
        .unwrap_err();

    assert_eq!(err.step, ScanStep::Inventory);
    assert!(matches!(err.source, ScanError::Transport { .. }));
}

#[tokio::test]
async fn test_detail_lookup_failure_is_fatal() {
    let executor = freebsd_host().respond("pkg audit -F -r -f /tmp/vuln.db", 1, AUDIT_SHARED_CVE);
    let fetcher = MockCveFetcher::failing();

    let err = scanner(executor, ScanOptions::default())
        .scan(&fetcher)
        .await
        .unwrap_err();

    assert_eq!(err.step, ScanStep::FetchDetails);
    assert!(matches!(err.source, ScanError::DetailLookup(_)));
}

#[tokio::test]
async fn test_proxy_is_prepended_to_pkg_commands() {
    let proxy_prefix = r#"http_proxy="http://proxy:3128" https_proxy="http://proxy:3128" HTTP_PROXY="http://proxy:3128" HTTPS_PROXY="http://proxy:3128" "#;
    let executor = MockExecutor::new()
        .respond("uname", 0, "FreeBSD\n")
        .respond("uname -r", 0, "10.3-RELEASE\n")
        .respond(&format!("{}pkg version -v", proxy_prefix), 0, PKG_VERSION)
        .respond("rm -f /tmp/vuln.db", 0, "")
        .respond(
            &format!("{}pkg audit -F -r -f /tmp/vuln.db", proxy_prefix),
            0,
            "",
        );
    let log = executor.log();
    let fetcher = MockCveFetcher::with_known(&[]);
    let options = ScanOptions {
        http_proxy: Some("http://proxy:3128".to_string()),
        ignore: IgnoreConfig::default(),
    };

    scanner(executor, options).scan(&fetcher).await.unwrap();

    let commands = log.lock().unwrap().clone();
    assert_eq!(commands.len(), 5);
    assert_eq!(commands[3], "rm -f /tmp/vuln.db");
}

#[tokio::test]
async fn test_ignored_cves_are_dropped() {
    let executor = freebsd_host().respond("pkg audit -F -r -f /tmp/vuln.db", 1, AUDIT_SHARED_CVE);
    let fetcher = MockCveFetcher::with_known(&["CVE-2016-0001", "CVE-2016-0002"]);
    let mut server = ServerConfig::new("web01", "192.0.2.10");
    server.ignore_cves = vec!["CVE-2016-0002".to_string()];
    let options = ScanOptions {
        http_proxy: None,
        ignore: IgnoreConfig {
            packages: vec!["nginx".to_string()],
            vulnerabilities: vec![],
        },
    };

    let result = FreeBsdScanner::new(server, Box::new(executor), options)
        .scan(&fetcher)
        .await
        .unwrap();

    assert_eq!(result.vulnerabilities.len(), 1);
    assert_eq!(result.vulnerabilities[0].cve_id, "CVE-2016-0001");
    assert_eq!(result.vulnerabilities[0].affected_packages.len(), 1);
    assert_eq!(result.vulnerabilities[0].affected_packages[0].name, "openssl");
}

#[tokio::test]
async fn test_detect_freebsd_rejects_other_os() {
    let executor = MockExecutor::new().respond("uname", 0, "Linux\n");

    let err = detect_freebsd(&executor).await.unwrap_err();
    assert!(matches!(err, ScanError::UnsupportedOs { .. }));
}

#[tokio::test]
async fn test_run_scanners_isolates_failures() {
    let good = scanner(
        freebsd_host().respond("pkg audit -F -r -f /tmp/vuln.db", 1, AUDIT_SHARED_CVE),
        ScanOptions::default(),
    );
    let bad = FreeBsdScanner::new(
        ServerConfig::new("linux01", "192.0.2.20"),
        Box::new(MockExecutor::new().respond("uname", 0, "Linux\n")),
        ScanOptions::default(),
    );
    let fetcher = MockCveFetcher::with_known(&["CVE-2016-0001"]);

    let report = run_scanners(&[good, bad], &fetcher, true).await;

    assert_eq!(report.hosts.len(), 1);
    assert_eq!(report.hosts[0].server, "web01");
    assert_eq!(report.hosts[0].vulnerabilities.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].server, "linux01");
    assert_eq!(report.failures[0].step, "OS detection");
    assert!(report.has_vulnerabilities());
}
