//! Correlation of `pkg audit` advisories with the installed package list.
//!
//! The relation between packages and CVEs is many-to-many: a package can be
//! hit by several advisories, an advisory can list several CVEs, and the same
//! CVE can show up under several packages. Instead of cross-linking packages
//! and vulnerabilities, [`correlate`] builds a [`VulnerabilityIndex`] once per
//! scan: an arena of links borrowing their package from the [`Inventory`],
//! and a CVE ID to link list mapping over it.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::{Result, ScanError};
use crate::model::{AdvisoryRecord, Inventory, PackageRecord};

/// One installed package tied to one advisory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVulnerabilityLink<'a> {
    pub package: &'a PackageRecord,
    pub advisory_id: String,
    pub vulnerability_ids: BTreeSet<String>,
}

/// CVE ID to links, built by [`correlate`].
///
/// Keys and the links under each key keep first-seen order.
#[derive(Debug, Default)]
pub struct VulnerabilityIndex<'a> {
    links: Vec<PackageVulnerabilityLink<'a>>,
    cve_ids: Vec<String>,
    by_cve: HashMap<String, Vec<usize>>,
}

impl<'a> VulnerabilityIndex<'a> {
    fn push(&mut self, link: PackageVulnerabilityLink<'a>, cve_ids: &[String]) {
        let idx = self.links.len();
        self.links.push(link);

        for cve_id in cve_ids {
            match self.by_cve.get_mut(cve_id) {
                // A block listing the same CVE twice still yields one link per key.
                Some(slots) => {
                    if slots.last() != Some(&idx) {
                        slots.push(idx);
                    }
                }
                None => {
                    self.cve_ids.push(cve_id.clone());
                    self.by_cve.insert(cve_id.clone(), vec![idx]);
                }
            }
        }
    }

    /// Distinct CVE IDs, in the order they were first seen.
    pub fn cve_ids(&self) -> &[String] {
        &self.cve_ids
    }

    pub fn contains(&self, cve_id: &str) -> bool {
        self.by_cve.contains_key(cve_id)
    }

    /// Links filed under `cve_id`, in insertion order.
    pub fn links_for<'s>(
        &'s self,
        cve_id: &str,
    ) -> impl Iterator<Item = &'s PackageVulnerabilityLink<'a>> + 's {
        self.by_cve
            .get(cve_id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.links[idx])
    }

    /// Every link, one per advisory that carried at least one CVE.
    pub fn links(&self) -> &[PackageVulnerabilityLink<'a>] {
        &self.links
    }

    /// Number of distinct CVE IDs.
    pub fn len(&self) -> usize {
        self.cve_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cve_ids.is_empty()
    }
}

/// Joins advisories against the inventory and indexes them by CVE ID.
///
/// Advisories without CVE IDs are skipped. An advisory for a package the
/// inventory does not know means the two command outputs do not describe
/// the same system, so the whole correlation fails and nothing is returned.
pub fn correlate<'a>(
    inventory: &'a Inventory,
    advisories: &[AdvisoryRecord],
) -> Result<VulnerabilityIndex<'a>> {
    let mut index = VulnerabilityIndex::default();

    for advisory in advisories {
        if !advisory.has_vulnerabilities() {
            continue;
        }

        let package = inventory.find_by_name(&advisory.package_name).ok_or_else(|| {
            ScanError::PackageNotInInventory {
                name: advisory.package_name.clone(),
            }
        })?;

        debug!(
            package = %package.name,
            advisory = %advisory.advisory_id,
            cves = advisory.vulnerability_ids.len(),
            "Linked advisory to installed package"
        );

        let link = PackageVulnerabilityLink {
            package,
            advisory_id: advisory.advisory_id.clone(),
            vulnerability_ids: advisory.vulnerability_ids.iter().cloned().collect(),
        };
        index.push(link, &advisory.vulnerability_ids);
    }

    Ok(index)
}
