use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A package installed on the scanned host, as reported by `pkg version -v`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub installed_version: String,
    /// Version offered by the ports tree or repository when the installed one is stale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_version: Option<String>,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, installed_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed_version: installed_version.into(),
            candidate_version: None,
        }
    }

    pub fn with_candidate(mut self, candidate: impl Into<String>) -> Self {
        self.candidate_version = Some(candidate.into());
        self
    }

    /// Returns true if a newer version is available for this package.
    pub fn is_outdated(&self) -> bool {
        self.candidate_version.is_some()
    }
}

/// The installed packages of one host, looked up by name.
///
/// An inventory belongs to a single scan run. Correlation borrows records out
/// of it, so it must outlive the vulnerability index built against it.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    packages: Vec<PackageRecord>,
    by_name: HashMap<String, usize>,
}

impl Inventory {
    /// Builds an inventory. When a name appears twice the first record wins.
    pub fn new(packages: Vec<PackageRecord>) -> Self {
        let mut by_name = HashMap::with_capacity(packages.len());
        for (idx, pkg) in packages.iter().enumerate() {
            by_name.entry(pkg.name.clone()).or_insert(idx);
        }
        Self { packages, by_name }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PackageRecord> {
        self.by_name.get(name).map(|&idx| &self.packages[idx])
    }

    pub fn packages(&self) -> &[PackageRecord] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn into_packages(self) -> Vec<PackageRecord> {
        self.packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name() {
        let inventory = Inventory::new(vec![
            PackageRecord::new("nginx", "1.10.1"),
            PackageRecord::new("openssl", "1.0.1").with_candidate("1.0.2"),
        ]);

        assert_eq!(inventory.len(), 2);
        assert_eq!(
            inventory.find_by_name("openssl").map(|p| p.installed_version.as_str()),
            Some("1.0.1")
        );
        assert!(inventory.find_by_name("curl").is_none());
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let inventory = Inventory::new(vec![
            PackageRecord::new("py27-setuptools", "1.0"),
            PackageRecord::new("py27-setuptools", "2.0"),
        ]);

        let pkg = inventory.find_by_name("py27-setuptools").unwrap();
        assert_eq!(pkg.installed_version, "1.0");
        assert_eq!(inventory.packages().len(), 2);
    }

    #[test]
    fn test_is_outdated() {
        assert!(!PackageRecord::new("nginx", "1.10.1").is_outdated());
        assert!(PackageRecord::new("nginx", "1.10.1")
            .with_candidate("1.10.2")
            .is_outdated());
    }
}
