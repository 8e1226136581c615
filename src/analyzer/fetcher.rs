//! HTTP fetcher implementation
//!
//! This module handles the page request of an analysis:
//! - Building the shared HTTP client with a proper user agent string
//! - GET of the page itself
//! - Classifying transport failures, non-success responses and non-HTML bodies

use crate::analyzer::AnalyzeError;
use crate::config::UserAgentConfig;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// A page body that was fetched successfully
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// The same client is shared by page fetches and link probes so connections
/// are pooled across workers.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use url_insight::analyzer::build_http_client;
/// use url_insight::config::UserAgentConfig;
///
/// let config = UserAgentConfig {
///     crawler_name: "UrlInsight".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    request_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    let user_agent = format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_url
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the page at `url` exactly once
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML or no Content-Type | `Ok(FetchedPage)` |
/// | Timeout | `AnalyzeError::Timeout` |
/// | Other transport failure | `AnalyzeError::Fetch` |
/// | Non-2xx status | `AnalyzeError::HttpStatus` |
/// | Non-HTML Content-Type | `AnalyzeError::Parse` |
pub async fn fetch_page(client: &Client, url: &Url) -> Result<FetchedPage, AnalyzeError> {
    let response = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            AnalyzeError::Timeout {
                url: url.to_string(),
            }
        } else {
            AnalyzeError::Fetch {
                url: url.to_string(),
                source: e,
            }
        }
    })?;

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return Err(AnalyzeError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    if let Some(ct) = content_type.as_deref() {
        if !is_html_content_type(ct) {
            return Err(AnalyzeError::Parse {
                url: url.to_string(),
                message: format!("Expected HTML, got {}", ct),
            });
        }
    }

    let body = response.text().await.map_err(|e| AnalyzeError::Fetch {
        url: url.to_string(),
        source: e,
    })?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        content_type,
        body,
    })
}

/// Returns true for HTML and XHTML media types
fn is_html_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    media_type == "text/html" || media_type == "application/xhtml+xml"
}
