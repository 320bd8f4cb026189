//! Extraction adapters for listing sites.
//!
//! Each adapter is a selector table plus a few per-site field rules. It
//! turns one search results page into candidate postings whose ids are
//! already assigned; [`collect_new`] then drops candidates the store has
//! seen and repeated ids within the page.

mod argenprop;
mod mercadolibre;
mod zonaprop;

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Posting, SourceKind};
use crate::storage::PostingStore;

pub use argenprop::ArgenpropParser;
pub use mercadolibre::MercadoLibreParser;
pub use zonaprop::ZonaPropParser;

/// A listing site's page-to-postings mapping.
pub trait SourceParser: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Site root that relative listing hrefs are resolved against.
    fn base_url(&self) -> &'static str;

    /// Candidate postings found in a parsed page, in page order.
    ///
    /// Cards missing a mandatory field are skipped.
    fn extract(&self, document: &Html) -> Vec<Posting>;

    /// Parse `html` and extract candidates.
    fn extract_html(&self, html: &str) -> Vec<Posting> {
        self.extract(&Html::parse_document(html))
    }
}

/// Build the adapter for a source.
pub fn parser_for(kind: SourceKind) -> Result<Box<dyn SourceParser>> {
    Ok(match kind {
        SourceKind::MercadoLibre => Box::new(MercadoLibreParser::new()?),
        SourceKind::ZonaProp => Box::new(ZonaPropParser::new()?),
        SourceKind::Argenprop => Box::new(ArgenpropParser::new()?),
    })
}

/// Candidates from `html` that are not yet stored, first occurrence per id.
pub async fn collect_new(
    parser: &dyn SourceParser,
    html: &str,
    store: &dyn PostingStore,
) -> Result<Vec<Posting>> {
    let candidates = parser.extract_html(html);
    let total = candidates.len();

    let mut seen = HashSet::new();
    let mut fresh = Vec::new();
    for posting in candidates {
        if !seen.insert(posting.id.clone()) {
            continue;
        }
        if store.exists(&posting.id).await? {
            continue;
        }
        fresh.push(posting);
    }

    log::debug!(
        "{}: {} candidates, {} new",
        parser.kind(),
        total,
        fresh.len()
    );
    Ok(fresh)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// First match of `selector` under `element`.
fn select_one<'a>(element: &ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

/// Text nodes of an element, space separated.
fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}
