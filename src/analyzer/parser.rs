//! HTML parser for structural facts and link discovery
//!
//! This module handles parsing HTML content to extract:
//! - The declared HTML version (from the doctype)
//! - Page title
//! - Heading counts per level
//! - Login form presence
//! - Hyperlink targets, in document order

use crate::model::{HeadingCounts, UNKNOWN_HTML_VERSION};
use scraper::{Html, Node, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// HTML version label derived from the doctype
    pub html_version: String,

    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Number of heading elements per level
    pub headings: HeadingCounts,

    /// True if any form contains a password input
    pub has_login_form: bool,

    /// Hyperlink targets (absolute URLs) in document order, duplicates kept
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts structural facts and links
///
/// Extraction is best-effort: malformed markup never aborts parsing, counts
/// simply reflect what the HTML5 parser recovers. Only a body with no
/// content at all is rejected.
///
/// # Link Extraction Rules
///
/// **Include:** every `<a href="...">`, resolved against `base_url`.
///
/// **Exclude:** `javascript:`, `mailto:`, `tel:` and `data:` targets,
/// fragment-only anchors, and anything that does not resolve to HTTP(S).
///
/// # Example
///
/// ```
/// use url_insight::analyzer::parse_html;
/// use url::Url;
///
/// let html = r#"<!DOCTYPE html><html><head><title>Test</title></head>
///               <body><h1>Hi</h1><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url).unwrap();
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.html_version, "HTML 5");
/// assert_eq!(parsed.headings.h1, 1);
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> Result<ParsedPage, String> {
    if html.trim().is_empty() {
        return Err("empty document".to_string());
    }

    let document = Html::parse_document(html);

    Ok(ParsedPage {
        html_version: extract_html_version(&document),
        title: extract_title(&document),
        headings: count_headings(&document),
        has_login_form: detect_login_form(&document),
        links: extract_links(&document, base_url),
    })
}

/// Derives the HTML version from the document's doctype
fn extract_html_version(document: &Html) -> String {
    document
        .tree
        .root()
        .children()
        .find_map(|child| match child.value() {
            Node::Doctype(doctype) => Some(html_version_from_doctype(
                doctype.name(),
                doctype.public_id(),
            )),
            _ => None,
        })
        .unwrap_or_else(|| UNKNOWN_HTML_VERSION.to_string())
}

/// Maps a doctype name and public identifier to a version label
pub fn html_version_from_doctype(name: &str, public_id: &str) -> String {
    if !name.eq_ignore_ascii_case("html") {
        return UNKNOWN_HTML_VERSION.to_string();
    }

    let public_id = public_id.to_ascii_uppercase();
    if public_id.trim().is_empty() {
        return "HTML 5".to_string();
    }

    let variant = if public_id.contains("FRAMESET") {
        "Frameset"
    } else if public_id.contains("TRANSITIONAL") {
        "Transitional"
    } else {
        "Strict"
    };

    if public_id.contains("XHTML 1.1") {
        "XHTML 1.1".to_string()
    } else if public_id.contains("XHTML 1.0") {
        format!("XHTML 1.0 {}", variant)
    } else if public_id.contains("HTML 4.01") {
        format!("HTML 4.01 {}", variant)
    } else if public_id.contains("HTML 3.2") {
        "HTML 3.2".to_string()
    } else if public_id.contains("HTML 2.0") {
        "HTML 2.0".to_string()
    } else {
        UNKNOWN_HTML_VERSION.to_string()
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Counts h1..h6 elements anywhere in the document
fn count_headings(document: &Html) -> HeadingCounts {
    let count = |tag: &str| -> u32 {
        Selector::parse(tag)
            .map(|selector| document.select(&selector).count() as u32)
            .unwrap_or(0)
    };

    HeadingCounts {
        h1: count("h1"),
        h2: count("h2"),
        h3: count("h3"),
        h4: count("h4"),
        h5: count("h5"),
        h6: count("h6"),
    }
}

/// Returns true if any form contains a password-typed input
fn detect_login_form(document: &Html) -> bool {
    let (Ok(form_selector), Ok(input_selector)) =
        (Selector::parse("form"), Selector::parse("input[type]"))
    else {
        return false;
    };

    document.select(&form_selector).any(|form| {
        form.select(&input_selector).any(|input| {
            input
                .value()
                .attr("type")
                .map(|t| t.trim().eq_ignore_ascii_case("password"))
                .unwrap_or(false)
        })
    })
}

/// Extracts all hyperlink targets from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}
