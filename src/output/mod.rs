//! Output module for reporting analysis results
//!
//! This module handles:
//! - Formatting one report block per URL
//! - Summarizing URL records by status

pub mod report;
pub mod stats;

pub use report::{format_report, format_url_report};
pub use stats::{load_statistics, print_statistics, StatusStatistics};
