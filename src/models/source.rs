//! Listing source identification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Known listing sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    MercadoLibre,
    ZonaProp,
    Argenprop,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [Self::MercadoLibre, Self::ZonaProp, Self::Argenprop];

    /// Substring that identifies the site in a listing URL.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::MercadoLibre => "mercadolibre",
            Self::ZonaProp => "zonaprop",
            Self::Argenprop => "argenprop",
        }
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            Self::MercadoLibre => "MercadoLibre",
            Self::ZonaProp => "ZonaProp",
            Self::Argenprop => "Argenprop",
        }
    }

    /// Guess the source of a listing URL by substring match.
    pub fn infer(url: &str) -> Option<Self> {
        let lower = url.to_lowercase();
        Self::ALL.into_iter().find(|kind| lower.contains(kind.keyword()))
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A search results page to scrape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub url: String,
}
