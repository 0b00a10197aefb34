use crate::model::AdvisoryRecord;

use super::pkg_version::split_name_version;

const VULNERABLE_SUFFIX: &str = " is vulnerable:";
const CVE_PREFIX: &str = "CVE:";
const WWW_PREFIX: &str = "WWW:";

/// Parses `pkg audit -r` output into advisory records.
///
/// Blocks that disclose no CVE (the trailing "N problem(s) ..." summary,
/// reverse-dependency listings, entries without a CVE line) are dropped.
pub fn parse_pkg_audit(stdout: &str) -> Vec<AdvisoryRecord> {
    split_into_blocks(stdout)
        .iter()
        .map(|block| parse_block(block))
        .filter(AdvisoryRecord::has_vulnerabilities)
        .collect()
}

/// Splits audit output into blank-line separated blocks.
///
/// Each line is trimmed; a block is its non-blank lines joined with `\n`.
pub fn split_into_blocks(stdout: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !block.is_empty() {
                blocks.push(block.join("\n"));
                block.clear();
            }
            continue;
        }
        block.push(line);
    }
    if !block.is_empty() {
        blocks.push(block.join("\n"));
    }

    blocks
}

/// Extracts the package name, CVE IDs and VuXML ID from one block.
///
/// ```text
/// nginx-1.10.1 is vulnerable:
/// nginx -- a specially crafted request might crash the worker process
/// CVE: CVE-2016-4450
/// WWW: https://vuxml.FreeBSD.org/freebsd/619367a8-2fd6-11e6-8bd6-a0369f1f8c0b.html
/// ```
pub fn parse_block(block: &str) -> AdvisoryRecord {
    let mut record = AdvisoryRecord::default();

    for line in block.lines() {
        if line.ends_with(VULNERABLE_SUFFIX) {
            if let Some((name, _)) = line.split_whitespace().next().and_then(split_name_version) {
                record.package_name = name.to_string();
            }
        } else if line.starts_with(CVE_PREFIX) {
            if let Some(cve_id) = line.split_whitespace().nth(1) {
                record.vulnerability_ids.push(cve_id.to_string());
            }
        } else if line.starts_with(WWW_PREFIX) {
            if let Some(last) = line.rsplit('/').next() {
                record.advisory_id = last.strip_suffix(".html").unwrap_or(last).to_string();
            }
        }
    }

    record
}
