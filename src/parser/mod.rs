//! Parsers for the text emitted by FreeBSD's `pkg` tool.
//!
//! Both `pkg version -v` and `pkg audit` print human-oriented text with no
//! stable machine format. The parsers here are best-effort: they never fail,
//! they only leave out lines and blocks they cannot make sense of.
//!
//! # Example
//!
//! ```
//! use bsdaudit::parser::{parse_pkg_audit, parse_pkg_version};
//!
//! let packages = parse_pkg_version("nginx-1.10.1 = up-to-date with port");
//! assert_eq!(packages[0].name, "nginx");
//!
//! let advisories = parse_pkg_audit(
//!     "nginx-1.10.1 is vulnerable:\nCVE: CVE-2016-0001\nWWW: https://vuxml.freebsd.org/freebsd/abc123.html\n",
//! );
//! assert_eq!(advisories[0].advisory_id, "abc123");
//! ```

mod pkg_audit;
mod pkg_version;

pub use pkg_audit::{parse_block, parse_pkg_audit, split_into_blocks};
pub use pkg_version::parse_pkg_version;
