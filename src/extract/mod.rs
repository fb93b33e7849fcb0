// src/extract/mod.rs

pub mod generic;
pub mod kam;
pub mod web;

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

/// A candidate product row as emitted by a source extractor, before the
/// normalizer has validated or typed anything. Every field is optional;
/// rows missing name, price, or market are dropped during cleaning.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RawRecord {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub unit_price: Option<String>,
    pub description: Option<String>,
    pub availability: Option<String>,
    pub regular_price: Option<f64>,
    pub discounted_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub discount_type: Option<String>,
    pub discount_period: Option<String>,
    pub category: Option<String>,
    pub market: Option<String>,
    pub last_updated: Option<String>,
    pub source_document: Option<String>,
}

/// Today's date in ISO 8601, used as `last_updated` for sources that
/// do not carry their own timestamp.
pub fn today_iso() -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    OffsetDateTime::now_utc()
        .date()
        .format(&fmt)
        .unwrap_or_else(|_| String::from("1970-01-01"))
}

/// Strip everything but digits and separators from a price cell, then
/// normalize the decimal comma and parse.
pub fn clean_price_text(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    kept.replace(',', ".").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_cell_cleanup() {
        assert_eq!(clean_price_text("1.234,50 ден"), None); // two separators, unparseable
        assert_eq!(clean_price_text("45,50 ден"), Some(45.5));
        assert_eq!(clean_price_text("  129 "), Some(129.0));
        assert_eq!(clean_price_text("n/a"), None);
    }

    #[test]
    fn today_is_iso_shaped() {
        let d = today_iso();
        assert_eq!(d.len(), 10);
        assert_eq!(d.as_bytes()[4], b'-');
        assert_eq!(d.as_bytes()[7], b'-');
    }
}
