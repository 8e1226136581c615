use crate::model::UrlStatus;
use url::Url;

/// Identifier of a URL record, and the only payload a task carries
pub type TaskId = u64;

/// Sentinel HTML version when the doctype is absent or unrecognized
pub const UNKNOWN_HTML_VERSION: &str = "Unknown";

/// Sentinel status code for a link whose probe failed
pub const UNREACHABLE_STATUS: u16 = 0;

/// A URL record held by the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub id: TaskId,
    pub original_url: String,
    pub status: UrlStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl UrlRecord {
    /// Parses the stored address
    ///
    /// Returns None when the stored string is not a valid absolute URL.
    pub fn url(&self) -> Option<Url> {
        Url::parse(&self.original_url).ok()
    }
}

/// Counts of heading elements by level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingCounts {
    pub h1: u32,
    pub h2: u32,
    pub h3: u32,
    pub h4: u32,
    pub h5: u32,
    pub h6: u32,
}

impl HeadingCounts {
    /// Returns the counts ordered H1 through H6
    pub fn as_array(&self) -> [u32; 6] {
        [self.h1, self.h2, self.h3, self.h4, self.h5, self.h6]
    }

    pub fn total(&self) -> u32 {
        self.as_array().iter().sum()
    }
}

/// Snapshot of one completed page analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub html_version: String,
    pub title: String,
    pub headings: HeadingCounts,
    pub has_login_form: bool,
}

/// One discovered hyperlink with its classification and probe result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub is_external: bool,
    pub status_code: u16,
}

impl Link {
    /// Returns true if the probe got an HTTP answer
    pub fn is_reachable(&self) -> bool {
        self.status_code != UNREACHABLE_STATUS
    }

    /// Returns true if the probe got a 4xx/5xx answer or no answer at all
    pub fn is_broken(&self) -> bool {
        !self.is_reachable() || self.status_code >= 400
    }
}

/// A persisted analysis snapshot
#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    pub id: i64,
    pub url_id: TaskId,
    pub result: AnalysisResult,
    pub created_at: String,
}

/// A persisted link row
#[derive(Debug, Clone)]
pub struct StoredLink {
    pub id: i64,
    pub url_id: TaskId,
    pub analysis_id: i64,
    pub link: Link,
}
