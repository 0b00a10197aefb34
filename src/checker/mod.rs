mod osv;

pub use osv::{parse_cvss_score, OsvDetailClient};

use crate::config::CveApiConfig;
use crate::error::Result;
use crate::model::CveDetail;
use async_trait::async_trait;

/// Source of CVE detail records.
#[async_trait]
pub trait CveDetailFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Looks up every ID in `cve_ids`.
    ///
    /// IDs the feed has no record of are simply missing from the result.
    /// Only a failure to talk to the feed is an error.
    async fn fetch_details(&self, cve_ids: &[String]) -> Result<Vec<CveDetail>>;
}

pub fn default_fetcher(config: &CveApiConfig) -> Result<OsvDetailClient> {
    OsvDetailClient::new(config)
}
