//! Data model for URL analysis
//!
//! # Components
//!
//! - `UrlStatus`: Lifecycle status of a URL record (queued, running, done, error, stopped)
//! - `UrlRecord`: The record a task identifier refers to
//! - `AnalysisResult` / `Link`: One analysis snapshot and its discovered links

mod records;
mod status;

pub use records::{
    AnalysisResult, HeadingCounts, Link, StoredAnalysis, StoredLink, TaskId, UrlRecord,
    UNKNOWN_HTML_VERSION, UNREACHABLE_STATUS,
};
pub use status::UrlStatus;
