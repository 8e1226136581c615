use url::Url;

/// Extracts the host from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// Port and scheme are ignored.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use url_insight::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Classifies a link target relative to the page it was found on
///
/// A target is external iff its host differs from the base host. The
/// comparison is case-insensitive; differing scheme or port alone keeps a
/// link internal. A target without a host is treated as internal.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use url_insight::url::is_external;
///
/// let base = Url::parse("http://example.com").unwrap();
/// assert!(!is_external(&base, &Url::parse("https://example.com:8080/about").unwrap()));
/// assert!(is_external(&base, &Url::parse("http://other.org").unwrap()));
/// ```
pub fn is_external(base: &Url, target: &Url) -> bool {
    match (extract_host(base), extract_host(target)) {
        (Some(base_host), Some(target_host)) => base_host != target_host,
        _ => false,
    }
}
