use serde::{Deserialize, Serialize};

/// One advisory block of `pkg audit` output, reduced to the fields we use.
///
/// A record with no vulnerability IDs is not an advisory and is dropped
/// before correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisoryRecord {
    pub package_name: String,
    pub vulnerability_ids: Vec<String>,
    /// VuXML identifier taken from the `WWW:` link.
    pub advisory_id: String,
}

impl AdvisoryRecord {
    pub fn has_vulnerabilities(&self) -> bool {
        !self.vulnerability_ids.is_empty()
    }
}

/// A named distribution security bulletin, as listed in a report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistroAdvisory {
    pub advisory_id: String,
}

impl DistroAdvisory {
    pub fn new(advisory_id: impl Into<String>) -> Self {
        Self {
            advisory_id: advisory_id.into(),
        }
    }
}
