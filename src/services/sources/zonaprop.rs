//! ZonaProp search results.

use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{Posting, SourceKind};
use crate::utils::url::resolve;
use crate::utils::{sanitize_text, truncate_chars};

use super::{SourceParser, parse_selector, select_one, text_of};

const TITLE_MAX: usize = 100;
const EXCERPT_MAX: usize = 140;

pub struct ZonaPropParser {
    card: Selector,
    link: Selector,
    price: Selector,
    description: Selector,
    location: Selector,
    features: Selector,
}

impl ZonaPropParser {
    pub const BASE_URL: &'static str = "https://www.zonaprop.com.ar";

    pub fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector("div.postingCardLayout-module__posting-card-container")?,
            link: parse_selector("h3.postingCard-module__posting-description a")?,
            price: parse_selector("div.postingPrices-module__price")?,
            description: parse_selector("h3.postingCard-module__posting-description")?,
            location: parse_selector("h2.postingLocations-module__location-text")?,
            features: parse_selector(
                "span.postingMainFeatures-module__posting-main-features-span",
            )?,
        })
    }
}

/// Short title from the link text; long descriptions are cut at "Descripción".
fn short_title(raw: &str) -> String {
    let head = raw.split("Descripción").next().unwrap_or(raw);
    truncate_chars(&sanitize_text(head), TITLE_MAX)
}

impl SourceParser for ZonaPropParser {
    fn kind(&self) -> SourceKind {
        SourceKind::ZonaProp
    }

    fn base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn extract(&self, document: &Html) -> Vec<Posting> {
        document
            .select(&self.card)
            .filter_map(|card| {
                let link = select_one(&card, &self.link)?;
                let description = select_one(&card, &self.description)?;
                let location = select_one(&card, &self.location)?;

                // "Consultar precio" cards have no price element
                let price = select_one(&card, &self.price)
                    .map(|p| text_of(&p))
                    .unwrap_or_default();

                let features: Vec<String> = card
                    .select(&self.features)
                    .map(|f| sanitize_text(&text_of(&f)))
                    .filter(|f| !f.is_empty())
                    .collect();
                let summary = if features.is_empty() {
                    truncate_chars(&sanitize_text(&text_of(&description)), EXCERPT_MAX)
                } else {
                    features.join(" | ")
                };

                let href = link.value().attr("href").filter(|h| !h.trim().is_empty())?;
                let href = resolve(self.base_url(), href);

                Some(Posting::new(
                    href,
                    &short_title(&text_of(&link)),
                    &price,
                    &text_of(&location),
                    &summary,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="postingCardLayout-module__posting-card-container">
            <div class="postingPrices-module__price">USD 120.000</div>
            <h2 class="postingLocations-module__location-text">Palermo, Capital Federal</h2>
            <span class="postingMainFeatures-module__posting-main-features-span">70 m² tot.</span>
            <span class="postingMainFeatures-module__posting-main-features-span">3 amb.</span>
            <h3 class="postingCard-module__posting-description">
                <a href="/propiedades/depto-palermo-123.html">Hermoso 3 ambientes al frente Descripción muy larga del inmueble</a>
            </h3>
        </div>
        <div class="postingCardLayout-module__posting-card-container">
            <h2 class="postingLocations-module__location-text">Almagro</h2>
            <h3 class="postingCard-module__posting-description">
                <a href="/propiedades/depto-almagro-456.html">Monoambiente luminoso</a>
            </h3>
        </div>
        <div class="postingCardLayout-module__posting-card-container">
            <h3 class="postingCard-module__posting-description">
                <a href="/propiedades/sin-ubicacion-789.html">Sin ubicación</a>
            </h3>
        </div>
    "#;

    #[test]
    fn test_extracts_cards_with_mandatory_fields() {
        let parser = ZonaPropParser::new().unwrap();
        let postings = parser.extract_html(PAGE);

        assert_eq!(postings.len(), 2);

        let first = &postings[0];
        assert_eq!(
            first.url,
            "https://www.zonaprop.com.ar/propiedades/depto-palermo-123.html"
        );
        assert_eq!(first.title, "Hermoso 3 ambientes al frente");
        assert_eq!(first.price, "USD 120.000");
        assert_eq!(first.description, "70 m² tot. | 3 amb.");
        assert_eq!(first.location, "Palermo, Capital Federal");
    }

    #[test]
    fn test_missing_price_and_features() {
        let parser = ZonaPropParser::new().unwrap();
        let postings = parser.extract_html(PAGE);

        let second = &postings[1];
        assert_eq!(second.price, "");
        assert_eq!(second.description, "Monoambiente luminoso");
    }

    #[test]
    fn test_short_title_truncates() {
        let long = "a".repeat(150);
        assert_eq!(short_title(&long).chars().count(), TITLE_MAX);
        assert_eq!(short_title("  Casa  Descripción: x"), "Casa");
    }
}
