use crate::model::{HostScanResult, ReportEntry, ScanReport, Severity};
use anyhow::Result;
use std::fmt::{self, Write};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct PackageRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Candidate")]
    candidate: String,
}

#[derive(Tabled)]
struct VulnRow {
    #[tabled(rename = "CVE")]
    cve: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Packages")]
    packages: String,
    #[tabled(rename = "Advisories")]
    advisories: String,
    #[tabled(rename = "Title")]
    title: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    print!("{}", generate_table_string(report)?);
    Ok(())
}

pub(crate) fn generate_table_string(report: &ScanReport) -> Result<String> {
    let mut out = String::new();
    writeln!(out)?;
    writeln!(
        out,
        "Scan completed at: {}",
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    for host in &report.hosts {
        write_host(&mut out, host)?;
    }

    if !report.failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed hosts:")?;
        for failure in &report.failures {
            writeln!(
                out,
                "  {}: {} failed: {}",
                failure.server, failure.step, failure.message
            )?;
        }
    }

    writeln!(out)?;
    write_summary(&mut out, report)?;
    Ok(out)
}

fn write_host(out: &mut String, host: &HostScanResult) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "== {} ({}) ==", host.server, host.distro)?;
    writeln!(out)?;

    // Only outdated packages; the full list is in the JSON output
    let outdated: Vec<PackageRow> = host
        .packages
        .iter()
        .filter(|p| p.is_outdated())
        .map(|p| PackageRow {
            name: truncate(&p.name, 40),
            installed: p.installed_version.clone(),
            candidate: p.candidate_version.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    if outdated.is_empty() {
        writeln!(out, "All {} packages are up to date.", host.packages.len())?;
    } else {
        writeln!(
            out,
            "{} of {} packages have updates:",
            outdated.len(),
            host.packages.len()
        )?;
        writeln!(out)?;
        writeln!(out, "{}", Table::new(outdated).with(Style::rounded()))?;
    }

    writeln!(out)?;
    if host.vulnerabilities.is_empty() {
        writeln!(out, "No vulnerabilities found.")?;
        return Ok(());
    }

    writeln!(out, "Found {} vulnerabilities:", host.vulnerabilities.len())?;
    writeln!(out)?;
    let rows: Vec<VulnRow> = host.vulnerabilities.iter().map(vuln_row).collect();
    writeln!(out, "{}", Table::new(rows).with(Style::rounded()))?;
    Ok(())
}

fn vuln_row(entry: &ReportEntry) -> VulnRow {
    let mut packages: Vec<String> = entry
        .affected_packages
        .iter()
        .map(|p| format!("{}-{}", p.name, p.installed_version))
        .collect();
    packages.dedup();

    let mut advisories: Vec<&str> = entry
        .advisories
        .iter()
        .map(|a| a.advisory_id.as_str())
        .collect();
    advisories.dedup();

    VulnRow {
        cve: entry.cve_id.clone(),
        severity: format_severity(&entry.detail.severity),
        packages: packages.join("\n"),
        advisories: advisories.join("\n"),
        title: truncate(entry.detail.title(), 50),
    }
}

fn format_severity(severity: &Severity) -> String {
    match severity {
        Severity::Critical => "\x1b[31mCRITICAL\x1b[0m".to_string(),
        Severity::High => "\x1b[91mHIGH\x1b[0m".to_string(),
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m".to_string(),
        Severity::Low => "\x1b[32mLOW\x1b[0m".to_string(),
        Severity::Unknown => "UNKNOWN".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn write_summary(out: &mut String, report: &ScanReport) -> fmt::Result {
    let total_cves: usize = report.hosts.iter().map(|h| h.vulnerabilities.len()).sum();
    let outdated: usize = report.hosts.iter().map(|h| h.outdated_count()).sum();

    writeln!(out, "Summary:")?;
    writeln!(
        out,
        "  Hosts scanned: {} ({} failed)",
        report.hosts.len() + report.failures.len(),
        report.failures.len()
    )?;
    writeln!(out, "  Vulnerabilities: {}", total_cves)?;
    writeln!(out, "  Packages with updates: {}", outdated)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CveDetail, Distro, DistroAdvisory, HostFailure, PackageRecord,
    };

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long title", 10), "a rathe...");
        assert_eq!(truncate("ääääääääääää", 5), "ää...");
    }

    #[test]
    fn test_vuln_row_dedups_repeated_package() {
        let openssl = PackageRecord::new("openssl", "1.0.1");
        let entry = ReportEntry {
            cve_id: "CVE-2016-2177".to_string(),
            detail: CveDetail::new("CVE-2016-2177"),
            affected_packages: vec![openssl.clone(), openssl],
            advisories: vec![DistroAdvisory::new("first"), DistroAdvisory::new("second")],
        };

        let row = vuln_row(&entry);
        assert_eq!(row.packages, "openssl-1.0.1");
        assert_eq!(row.advisories, "first\nsecond");
        assert_eq!(row.severity, "UNKNOWN");
    }

    #[test]
    fn test_table_string_mentions_hosts_and_failures() {
        let report = ScanReport::new(
            vec![HostScanResult {
                server: "web01".to_string(),
                distro: Distro {
                    family: "FreeBSD".to_string(),
                    release: "11.0-RELEASE".to_string(),
                },
                packages: vec![
                    PackageRecord::new("bash", "4.2.45").with_candidate("4.3.42_1"),
                    PackageRecord::new("nginx", "1.10.1"),
                ],
                vulnerabilities: Vec::new(),
            }],
            vec![HostFailure {
                server: "db01".to_string(),
                step: "pkg audit".to_string(),
                message: "timed out".to_string(),
            }],
        );

        let out = generate_table_string(&report).unwrap();
        assert!(out.contains("== web01 (FreeBSD 11.0-RELEASE) =="));
        assert!(out.contains("1 of 2 packages have updates:"));
        assert!(out.contains("No vulnerabilities found."));
        assert!(out.contains("db01: pkg audit failed: timed out"));
        assert!(out.contains("Hosts scanned: 2 (1 failed)"));
    }
}
