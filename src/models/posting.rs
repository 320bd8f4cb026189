//! Posting data structure.

use serde::{Deserialize, Serialize};

use crate::utils::{sanitize_text, url::normalize_id};

/// A real-estate listing extracted from a source page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Posting {
    /// Store-assigned insertion sequence (0 until inserted)
    #[serde(default)]
    pub seq: u64,

    /// Content-address derived from the listing URL
    pub id: String,

    /// Original listing URL
    pub url: String,

    /// Listing title
    pub title: String,

    /// Price as shown on the source (may be empty)
    #[serde(default)]
    pub price: String,

    /// Neighbourhood or address
    #[serde(default)]
    pub location: String,

    /// Short description or feature summary
    #[serde(default)]
    pub description: String,

    /// Delivered, or suppressed as a duplicate
    #[serde(default)]
    pub sent: bool,
}

impl Posting {
    /// Build an unsent posting; the id is derived from `url` and every
    /// free-text field is whitespace-normalized.
    pub fn new(
        url: impl Into<String>,
        title: &str,
        price: &str,
        location: &str,
        description: &str,
    ) -> Self {
        let url = url.into();
        Self {
            seq: 0,
            id: normalize_id(&url),
            url,
            title: sanitize_text(title),
            price: sanitize_text(price),
            location: sanitize_text(location),
            description: sanitize_text(description),
            sent: false,
        }
    }

    /// The id this posting should carry under the current normalization.
    pub fn canonical_id(&self) -> String {
        normalize_id(&self.url)
    }

    /// Whether the stored id predates the current normalization.
    pub fn needs_renormalization(&self) -> bool {
        self.id != self.canonical_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_canonical_id() {
        let posting = Posting::new("https://site/a?x=1", "t", "", "", "");
        assert_eq!(posting.id, normalize_id("https://site/a"));
        assert_eq!(posting.seq, 0);
        assert!(!posting.sent);
        assert!(!posting.needs_renormalization());
    }

    #[test]
    fn test_new_sanitizes_fields() {
        let posting = Posting::new(
            "https://site/a",
            "  Depto\n 2 amb ",
            "USD\n 120.000",
            "Palermo,\n\n CABA",
            "50 m²   |  2 amb",
        );
        assert_eq!(posting.title, "Depto 2 amb");
        assert_eq!(posting.price, "USD 120.000");
        assert_eq!(posting.location, "Palermo, CABA");
        assert_eq!(posting.description, "50 m² | 2 amb");
    }

    #[test]
    fn test_legacy_id_needs_renormalization() {
        let mut posting = Posting::new("https://site/a?x=1", "t", "", "", "");
        posting.id = normalize_id("https://site/a?x=1x");
        assert!(posting.needs_renormalization());
    }

    #[test]
    fn test_deserialize_with_missing_optional_fields() {
        let json = r#"{"id":"abc","url":"https://site/a","title":"t"}"#;
        let posting: Posting = serde_json::from_str(json).unwrap();
        assert_eq!(posting.seq, 0);
        assert_eq!(posting.price, "");
        assert!(!posting.sent);
    }
}
