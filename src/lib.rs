pub mod checker;
pub mod config;
pub mod correlate;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;
pub mod remote;
pub mod report;
pub mod scanner;

pub use config::Config;
pub use error::{HostScanError, ScanError, ScanStep};
pub use model::{CveDetail, HostScanResult, Inventory, PackageRecord, ReportEntry, ScanReport};
pub use scanner::FreeBsdScanner;
