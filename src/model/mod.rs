//! Core data types for inventories, advisories, and scan reports.
//!
//! - [`PackageRecord`] / [`Inventory`] - what `pkg version -v` says is installed
//! - [`AdvisoryRecord`] - one parsed `pkg audit` block
//! - [`CveDetail`] - detail fetched from the vulnerability feed
//! - [`ReportEntry`] - one CVE with its affected packages and advisories
//! - [`ScanReport`] - results across all scanned hosts
//!
//! # Example
//!
//! ```
//! use bsdaudit::model::{Inventory, PackageRecord};
//!
//! let inventory = Inventory::new(vec![PackageRecord::new("nginx", "1.10.1")]);
//! assert!(inventory.find_by_name("nginx").is_some());
//! ```

mod advisory;
mod package;
mod vulnerability;

pub use advisory::*;
pub use package::*;
pub use vulnerability::*;
