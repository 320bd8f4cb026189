//! MercadoLibre Inmuebles search results.

use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{Posting, SourceKind};
use crate::utils::sanitize_text;
use crate::utils::url::{resolve, strip_fragment};

use super::{SourceParser, parse_selector, select_one, text_of};

pub struct MercadoLibreParser {
    card: Selector,
    link: Selector,
    price: Selector,
    attributes: Selector,
    location: Selector,
}

impl MercadoLibreParser {
    pub const BASE_URL: &'static str = "https://inmuebles.mercadolibre.com.ar";

    pub fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector("div.andes-card")?,
            // the title anchor doubles as the link
            link: parse_selector("a.poly-component__title")?,
            price: parse_selector("span.andes-money-amount__fraction")?,
            attributes: parse_selector("ul.poly-attributes_list")?,
            location: parse_selector("span.poly-component__location")?,
        })
    }
}

impl SourceParser for MercadoLibreParser {
    fn kind(&self) -> SourceKind {
        SourceKind::MercadoLibre
    }

    fn base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn extract(&self, document: &Html) -> Vec<Posting> {
        document
            .select(&self.card)
            .filter_map(|card| {
                let link = select_one(&card, &self.link)?;
                let price = select_one(&card, &self.price)?;
                let attributes = select_one(&card, &self.attributes)?;
                let location = select_one(&card, &self.location)?;

                let href = strip_fragment(link.value().attr("href").unwrap_or(""));
                if href.trim().is_empty() {
                    return None;
                }
                let href = resolve(self.base_url(), href);

                Some(Posting::new(
                    href,
                    &text_of(&link),
                    &format!("$ {}", sanitize_text(&text_of(&price))),
                    &text_of(&location),
                    &text_of(&attributes),
                ))
            })
            .collect()
    }
}
