//! URL resolution and naming helpers.

use url::Url;

/// Resolve a possibly-relative reference against a base URL.
///
/// Absolute references pass through; when the base does not parse the raw
/// reference is returned unchanged.
pub fn resolve_url(base: &str, reference: &str) -> String {
    match Url::parse(base) {
        Ok(base) => base
            .join(reference)
            .map(String::from)
            .unwrap_or_else(|_| reference.to_string()),
        Err(_) => reference.to_string(),
    }
}

/// Derive a lower-case extension (no leading dot) from a URL's path component.
pub fn url_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    let name = path.rsplit('/').next().unwrap_or("");
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Human-readable stand-in for a missing page title, derived from the URL.
pub fn url_fallback_title(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        let host = parsed.host_str().unwrap_or("");
        let name = format!("{}{}", host, parsed.path());
        if !name.is_empty() {
            return name;
        }
    }
    if url.is_empty() {
        "unnamed".to_string()
    } else {
        url.to_string()
    }
}
