use crate::model::ScanReport;
use anyhow::Result;

pub fn print_json(report: &ScanReport) -> Result<()> {
    println!("{}", generate_json_string(report)?);
    Ok(())
}

pub(crate) fn generate_json_string(report: &ScanReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CveDetail, DistroAdvisory, Distro, HostScanResult, PackageRecord, ReportEntry,
    };

    #[test]
    fn test_json_shape() {
        let nginx = PackageRecord::new("nginx", "1.10.1");
        let report = ScanReport::new(
            vec![HostScanResult {
                server: "web01".to_string(),
                distro: Distro {
                    family: "FreeBSD".to_string(),
                    release: "10.3-RELEASE".to_string(),
                },
                packages: vec![nginx.clone()],
                vulnerabilities: vec![ReportEntry {
                    cve_id: "CVE-2016-4450".to_string(),
                    detail: CveDetail::new("CVE-2016-4450"),
                    affected_packages: vec![nginx],
                    advisories: vec![DistroAdvisory::new("619367a8")],
                }],
            }],
            Vec::new(),
        );

        let value: serde_json::Value =
            serde_json::from_str(&generate_json_string(&report).unwrap()).unwrap();
        let host = &value["hosts"][0];

        assert_eq!(host["server"], "web01");
        assert_eq!(host["packages"][0]["installed_version"], "1.10.1");
        assert!(host["packages"][0].get("candidate_version").is_none());
        assert_eq!(host["vulnerabilities"][0]["cve_id"], "CVE-2016-4450");
        assert_eq!(host["vulnerabilities"][0]["detail"]["severity"], "unknown");
        assert_eq!(
            host["vulnerabilities"][0]["advisories"][0]["advisory_id"],
            "619367a8"
        );
        assert!(value.get("failures").is_none());
    }
}
