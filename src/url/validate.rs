use crate::UrlError;
use url::Url;

/// Parses an address accepted for analysis
///
/// The address must be absolute, use http or https, and carry a host. No
/// other normalization is applied; the stored address is the parsed form.
///
/// # Examples
///
/// ```
/// use url_insight::url::validate_address;
///
/// let url = validate_address("https://Example.com/docs").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// assert!(validate_address("mailto:someone@example.com").is_err());
/// ```
pub fn validate_address(address: &str) -> Result<Url, UrlError> {
    let url = Url::parse(address.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
