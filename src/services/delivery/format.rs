//! Message rendering for Telegram's HTML parse mode.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::Posting;

const PRICE_ICON: char = '\u{1F4B0}';
const LOCATION_ICON: char = '\u{1F4CD}';

/// Full message: linked title, price, location and description.
pub fn format_primary(posting: &Posting) -> String {
    format!(
        "{}\n\n{}",
        header(posting, encode_text(&posting.title).as_ref()),
        encode_text(&posting.description)
    )
}

/// Short message used after the full one was rejected.
///
/// Drops the description and falls back to the posting id when the title
/// is empty.
pub fn format_degraded(posting: &Posting) -> String {
    let title = posting.title.trim();
    let title = if title.is_empty() {
        posting.id.as_str()
    } else {
        title
    };
    header(posting, encode_text(title).as_ref())
}

fn header(posting: &Posting, title: &str) -> String {
    format!(
        "<a href=\"{}\"><b>{}</b></a>\n{}<i>{}</i>\n{}<i>{}</i>",
        encode_double_quoted_attribute(&posting.url),
        title,
        PRICE_ICON,
        encode_text(posting.price.trim()),
        LOCATION_ICON,
        encode_text(posting.location.trim()),
    )
}
