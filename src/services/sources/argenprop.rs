//! Argenprop search results.

use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{Posting, SourceKind};
use crate::utils::url::resolve;

use super::{SourceParser, parse_selector, select_one, text_of};

pub struct ArgenpropParser {
    card: Selector,
    link: Selector,
    price: Selector,
    description: Selector,
    location: Selector,
    title: Selector,
}

impl ArgenpropParser {
    pub const BASE_URL: &'static str = "https://www.argenprop.com";

    pub fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector("div.listing__item")?,
            link: parse_selector("a.card")?,
            price: parse_selector("p.card__price")?,
            description: parse_selector("p.card__title--primary")?,
            location: parse_selector("p.card__address")?,
            title: parse_selector("h2.card__title, p.card__title--primary")?,
        })
    }
}

impl SourceParser for ArgenpropParser {
    fn kind(&self) -> SourceKind {
        SourceKind::Argenprop
    }

    fn base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn extract(&self, document: &Html) -> Vec<Posting> {
        document
            .select(&self.card)
            .filter_map(|card| {
                let link = select_one(&card, &self.link)?;
                let title = select_one(&card, &self.title)?;

                let optional = |selector: &Selector| {
                    select_one(&card, selector)
                        .map(|e| text_of(&e))
                        .unwrap_or_default()
                };

                let href = link.value().attr("href").filter(|h| !h.trim().is_empty())?;
                let href = resolve(self.base_url(), href);

                Some(Posting::new(
                    href,
                    &text_of(&title),
                    &optional(&self.price),
                    &optional(&self.location),
                    &optional(&self.description),
                ))
            })
            .collect()
    }
}
