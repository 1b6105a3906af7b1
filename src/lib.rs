//! HTTP security posture scanner: fetches a host, runs independent checks
//! against the responses and grades the result.

pub mod config;
pub mod core;
pub mod logging;

pub use crate::config::ScannerConfig;
pub use crate::core::checks::{Check, CheckRegistry};
pub use crate::core::models::{ResponseBundle, ScanOptions, ScanOutcome, ScanReport};
pub use crate::core::scanner::{run_full_scan, scan_bundle};
