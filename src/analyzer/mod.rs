//! Page analyzer
//!
//! This module turns one page address into one `AnalysisResult` and its
//! ordered links:
//! - HTTP fetch of the page (one GET, no retries)
//! - HTML parsing of structural facts and hyperlinks
//! - Classification and probing of every discovered link
//!
//! The worker pool only sees the `PageAnalyzer` trait, so tests can swap in
//! scripted analyzers.

mod fetcher;
mod parser;
mod prober;

pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use parser::{html_version_from_doctype, parse_html, resolve_link, ParsedPage};
pub use prober::LinkProber;

use crate::config::Config;
use crate::model::{AnalysisResult, Link};
use crate::InsightError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that fail an analysis as a unit
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    #[error("HTTP error for {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

/// Contract between the worker pool and the page analysis
///
/// Dropping the returned future cancels the fetch and every outstanding link
/// probe; the pool relies on this to enforce its per-task deadline.
#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    async fn analyze(&self, address: &Url) -> Result<(AnalysisResult, Vec<Link>), AnalyzeError>;
}

/// Analyzer backed by reqwest and scraper
#[derive(Debug, Clone)]
pub struct HttpPageAnalyzer {
    client: Client,
    prober: LinkProber,
}

impl HttpPageAnalyzer {
    pub fn new(client: Client, prober: LinkProber) -> Self {
        Self { client, prober }
    }

    /// Builds the analyzer and its shared HTTP client from configuration
    pub fn from_config(config: &Config) -> Result<Self, InsightError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.pool.task_timeout_secs),
        )?;
        let prober = LinkProber::from_settings(client.clone(), &config.prober);
        Ok(Self::new(client, prober))
    }
}

#[async_trait]
impl PageAnalyzer for HttpPageAnalyzer {
    async fn analyze(&self, address: &Url) -> Result<(AnalysisResult, Vec<Link>), AnalyzeError> {
        if !matches!(address.scheme(), "http" | "https") || address.host_str().is_none() {
            return Err(AnalyzeError::MalformedAddress(address.to_string()));
        }

        let page = fetch_page(&self.client, address).await?;
        tracing::debug!(
            "Fetched {} ({}, {} bytes, content-type {:?})",
            page.final_url,
            page.status_code,
            page.body.len(),
            page.content_type
        );

        // Relative hrefs resolve against where the page actually lives
        let parsed = parse_html(&page.body, &page.final_url).map_err(|message| {
            AnalyzeError::Parse {
                url: address.to_string(),
                message,
            }
        })?;

        let result = AnalysisResult {
            html_version: parsed.html_version,
            title: parsed.title.unwrap_or_default(),
            headings: parsed.headings,
            has_login_form: parsed.has_login_form,
        };

        tracing::debug!("Probing {} links from {}", parsed.links.len(), address);
        let links = self.prober.probe_all(address, parsed.links).await;

        Ok((result, links))
    }
}
