//! Assembly of per-CVE report entries from the correlation index.

use std::collections::HashSet;

use crate::config::IgnoreConfig;
use crate::correlate::VulnerabilityIndex;
use crate::model::{CveDetail, DistroAdvisory, ReportEntry};

/// Builds one report entry per CVE that is both in `index` and in `details`.
///
/// Entries follow the order of `details`. The feed is allowed to know fewer
/// CVEs than were asked for; CVEs it has no record of are left out.
pub fn assemble_report(
    index: &VulnerabilityIndex<'_>,
    details: impl IntoIterator<Item = CveDetail>,
) -> Vec<ReportEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for detail in details {
        if !index.contains(&detail.cve_id) || !seen.insert(detail.cve_id.clone()) {
            continue;
        }

        let (affected_packages, advisories): (Vec<_>, Vec<_>) = index
            .links_for(&detail.cve_id)
            .map(|link| {
                (
                    link.package.clone(),
                    DistroAdvisory::new(link.advisory_id.clone()),
                )
            })
            .unzip();

        entries.push(ReportEntry {
            cve_id: detail.cve_id.clone(),
            detail,
            affected_packages,
            advisories,
        });
    }

    entries
}

/// Drops suppressed findings from a host's report.
///
/// `ignore_cves` is the per-server list; `ignore` is the global one. Ignored
/// packages are removed from each entry, and an entry left without packages
/// is removed altogether.
pub fn filter_ignored(
    entries: Vec<ReportEntry>,
    ignore_cves: &[String],
    ignore: &IgnoreConfig,
) -> Vec<ReportEntry> {
    entries
        .into_iter()
        .filter(|e| {
            !ignore_cves.contains(&e.cve_id) && !ignore.should_ignore_vulnerability(&e.cve_id)
        })
        .filter_map(|mut entry| {
            if ignore.packages.is_empty() {
                return Some(entry);
            }
            let (packages, advisories): (Vec<_>, Vec<_>) = entry
                .affected_packages
                .into_iter()
                .zip(entry.advisories)
                .filter(|(pkg, _)| !ignore.should_ignore_package(&pkg.name))
                .unzip();
            if packages.is_empty() {
                return None;
            }
            entry.affected_packages = packages;
            entry.advisories = advisories;
            Some(entry)
        })
        .collect()
}
