// src/utils/url.rs

//! URL canonicalization and posting identity.
//!
//! A posting's id is the SHA-1 of its canonical URL, so the same listing
//! reached through different query strings, fragments, trailing slashes or
//! host casing always collapses to one id.

use sha1::{Digest, Sha1};
use url::Url;

/// Canonical form of an absolute URL.
///
/// Scheme and host are lower-cased, the query string and fragment are
/// dropped and trailing slashes are stripped from the path. The result is
/// case-folded as a whole. Returns `None` when `raw` is not an absolute URL
/// with both a scheme and a host.
///
/// # Examples
/// ```
/// use posting_bot::utils::url::canonicalize;
///
/// assert_eq!(
///     canonicalize("https://Example.COM/Listing/12/?utm=x#photos"),
///     Some("https://example.com/listing/12".to_string())
/// );
/// assert_eq!(canonicalize("not a url"), None);
/// ```
pub fn canonicalize(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str().filter(|h| !h.is_empty())?;

    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let path = parsed.path().trim_end_matches('/');

    Some(format!("{}://{}{}", parsed.scheme(), authority, path).to_lowercase())
}

/// Stable content-address for a listing URL.
///
/// Total: text that is not an absolute URL is hashed as-is (case-folded),
/// which keeps ingestion going at the cost of weaker dedup for that input.
/// Both paths share one hash space.
pub fn normalize_id(raw: &str) -> String {
    match canonicalize(raw) {
        Some(canonical) => sha1_hex(&canonical),
        None => {
            log::debug!("Not an absolute URL, hashing raw text: {raw:?}");
            sha1_hex(&raw.to_lowercase())
        }
    }
}

fn sha1_hex(text: &str) -> String {
    hex::encode(Sha1::digest(text.as_bytes()))
}

/// Resolve a listing href against the source's base URL.
///
/// # Examples
/// ```
/// use posting_bot::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://www.argenprop.com", "/departamento-en-venta--123"),
///     "https://www.argenprop.com/departamento-en-venta--123"
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{}", base.trim_end_matches('/'), href))
}

/// Strip the fragment from a URL string.
pub fn strip_fragment(href: &str) -> &str {
    href.split('#').next().unwrap_or(href)
}
