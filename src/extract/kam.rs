// src/extract/kam.rs

use super::{RawRecord, today_iso};
use crate::classify;
use crate::pdf_text::{self, PdfText};
use regex::Regex;
use std::path::Path;
use time::Date;
use time::macros::format_description;
use tracing::{info, warn};

/// Fixed market identifier for this source.
pub const MARKET: &str = "KAM";

/// Availability marker literal; the source format does not encode
/// negative availability in the fields these patterns reach.
const AVAILABLE: &str = "Да";

/// Extract product rows from a KAM price-list PDF.
pub fn extract(pdf_bytes: &[u8]) -> Vec<RawRecord> {
    let text = match pdf_text::read_document(pdf_bytes) {
        PdfText::Text(text) => text,
        PdfText::Scanned => {
            warn!("scanned KAM document — nothing to extract");
            return Vec::new();
        }
        PdfText::Unreadable(e) => {
            warn!(error = %e, "unreadable KAM document");
            return Vec::new();
        }
    };
    parse_text(&text)
}

/// Parse the text of a KAM price list. Exposed separately from the PDF
/// read so the line grammar is testable on plain fixtures.
pub fn parse_text(text: &str) -> Vec<RawRecord> {
    let date_re =
        Regex::new(r"Датум и време на последно ажурирање на цените: (\d{2}\.\d{2}\.\d{4})")
            .unwrap();
    let last_updated = date_re
        .captures(text)
        .and_then(|cap| parse_stamp_date(&cap[1]))
        .unwrap_or_else(today_iso);

    let price_re = Regex::new(r"(\d+)ден\.").unwrap();
    let unit_re = Regex::new(r"(\d+) гр = ([\d.]+)").unwrap();
    let regular_re = Regex::new(r"Да\s+(\d+)ден\.").unwrap();
    let percent_re = Regex::new(r"(?i)попуст\s*\((%)\)\s*(\d+)").unwrap();
    let discount_price_re = Regex::new(r"(?i)Цена со\s+попуст\s+(\d+)").unwrap();

    let mut records = Vec::new();
    // Rows only start after the header block: the line carrying both
    // column markers plus the six lines that follow it. The header
    // repeats on every page of the concatenated text.
    let mut in_rows = false;
    let mut skip = 0usize;

    for line in text.lines() {
        if line.contains("Назив на") && line.contains("Продажна") {
            in_rows = true;
            skip = 6;
            continue;
        }
        if !in_rows {
            continue;
        }
        if skip > 0 {
            skip -= 1;
            continue;
        }
        if line.trim().is_empty() || line.contains("Назив на") || line.contains("Датум и време") {
            continue;
        }

        let Some(price_match) = price_re.captures(line) else {
            continue; // no partial records for lines without a price anchor
        };
        let anchor = price_match.get(0).map_or("", |m| m.as_str());
        let Some(price) = price_match[1].parse::<f64>().ok() else {
            continue;
        };
        let mut parts = line.splitn(2, anchor);
        let name = parts.next().unwrap_or("").trim().to_string();
        let rest = parts.next().unwrap_or("").trim();

        let unit_price = unit_re.find(rest).map(|m| m.as_str().to_string());

        let description = unit_price.as_deref().and_then(|unit| {
            let after_unit = rest.splitn(2, unit).nth(1)?;
            if after_unit.contains(AVAILABLE) {
                let desc = after_unit.split(AVAILABLE).next()?.trim();
                if desc.is_empty() { None } else { Some(desc.to_string()) }
            } else {
                None
            }
        });

        let regular_price = regular_re
            .captures(rest)
            .and_then(|cap| cap[1].parse::<f64>().ok());

        let mut discount_percent = None;
        let mut discounted_price = None;
        if rest.to_lowercase().contains("попуст") {
            discount_percent = percent_re
                .captures(rest)
                .and_then(|cap| cap[2].parse::<f64>().ok());
            discounted_price = discount_price_re
                .captures(rest)
                .and_then(|cap| cap[1].parse::<f64>().ok());
        }

        records.push(RawRecord {
            category: Some(classify::classify_cyrillic(&name).to_string()),
            name: Some(name),
            price: Some(price),
            unit_price,
            description,
            availability: Some(AVAILABLE.to_string()),
            regular_price,
            discounted_price,
            discount_percent,
            market: Some(MARKET.to_string()),
            last_updated: Some(last_updated.clone()),
            ..Default::default()
        });
    }

    info!(rows = records.len(), last_updated = %last_updated, "KAM extraction done");
    records
}

/// Convert the localized `DD.MM.YYYY` stamp into ISO 8601.
fn parse_stamp_date(stamp: &str) -> Option<String> {
    let parse_fmt = format_description!("[day].[month].[year]");
    let iso_fmt = format_description!("[year]-[month]-[day]");
    Date::parse(stamp, &parse_fmt)
        .ok()
        .and_then(|d| d.format(&iso_fmt).ok())
}

/// Extract a KAM price list and serialize it to a comma-separated file.
/// Returns `false` when extraction produced no rows.
pub fn export(pdf_bytes: &[u8], destination: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let records = extract(pdf_bytes);
    if records.is_empty() {
        return Ok(false);
    }
    let mut writer = csv::Writer::from_path(destination)?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(rows = records.len(), file = %destination.display(), "KAM export written");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Назив на производот Продажна цена\n1\n2\n3\n4\n5\n6\n";

    fn parse_one(line: &str) -> RawRecord {
        let text = format!("{HEADER}{line}\n");
        let mut records = parse_text(&text);
        assert_eq!(records.len(), 1);
        records.remove(0)
    }

    #[test]
    fn price_anchor_and_unit_price() {
        let rec = parse_one("ЛАЈБИЦИ СЛИБО 15ден. 100 гр = 7.5 ЛАЈБИЦИ ДИЕТ Да 23ден.");
        assert_eq!(rec.name.as_deref(), Some("ЛАЈБИЦИ СЛИБО"));
        assert_eq!(rec.price, Some(15.0));
        assert_eq!(rec.unit_price.as_deref(), Some("100 гр = 7.5"));
        assert_eq!(rec.description.as_deref(), Some("ЛАЈБИЦИ ДИЕТ"));
        assert_eq!(rec.regular_price, Some(23.0));
        assert_eq!(rec.availability.as_deref(), Some(AVAILABLE));
        assert_eq!(rec.market.as_deref(), Some(MARKET));
    }

    #[test]
    fn lines_without_price_anchor_are_skipped() {
        let text = format!("{HEADER}ПРОИЗВОД БЕЗ ЦЕНА\n");
        assert!(parse_text(&text).is_empty());
    }

    #[test]
    fn lines_before_header_contribute_nothing() {
        assert!(parse_text("МЛЕКО 45ден.\n").is_empty());
    }

    #[test]
    fn header_block_is_skipped() {
        // The six lines after the marker belong to the header block
        let text = "Назив на производот Продажна цена\nЛЕБ 30ден.\nа\nб\nв\nг\nд\nМЛЕКО 45ден.\n";
        let records = parse_text(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("МЛЕКО"));
    }

    #[test]
    fn date_stamp_becomes_iso() {
        let text = format!(
            "Датум и време на последно ажурирање на цените: 05.03.2025\n{HEADER}ЛЕБ 30ден.\n"
        );
        let records = parse_text(&text);
        assert_eq!(records[0].last_updated.as_deref(), Some("2025-03-05"));
    }

    #[test]
    fn malformed_stamp_falls_back_to_today() {
        let text = format!(
            "Датум и време на последно ажурирање на цените: 99.99.2025\n{HEADER}ЛЕБ 30ден.\n"
        );
        let records = parse_text(&text);
        assert_eq!(records[0].last_updated.as_deref(), Some(today_iso().as_str()));
    }

    #[test]
    fn discount_keyword_gates_narrower_patterns() {
        let rec = parse_one("КАФЕ 120ден. Да 150ден. попуст (%) 20 Цена со попуст 120");
        assert_eq!(rec.discount_percent, Some(20.0));
        assert_eq!(rec.discounted_price, Some(120.0));

        // Keyword present but the narrower patterns miss: conservative,
        // no discount fields are invented.
        let rec = parse_one("ЧАЈ 80ден. Да 90ден. неделен попуст");
        assert_eq!(rec.discount_percent, None);
        assert_eq!(rec.discounted_price, None);

        // No keyword at all: patterns are not even attempted.
        let rec = parse_one("ЛЕБ 30ден. Да 30ден.");
        assert_eq!(rec.discount_percent, None);
        assert_eq!(rec.discounted_price, None);
    }

    #[test]
    fn category_from_cyrillic_table() {
        let rec = parse_one("МЛЕКО СВЕЖО 2.8% 45ден.");
        assert_eq!(rec.category.as_deref(), Some("Млеко и млечни производи"));
        let rec = parse_one("НЕПОЗНАТ ПРОИЗВОД 10ден.");
        assert_eq!(rec.category.as_deref(), Some(classify::DEFAULT_CATEGORY_MK));
    }
}
