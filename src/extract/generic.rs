// src/extract/generic.rs

use super::RawRecord;
use crate::classify;
use crate::normalize::title_case;
use crate::pdf_text::{self, PdfText};
use regex::Regex;
use tracing::{info, warn};

/// Market names we recognize in filenames and document text.
const KNOWN_MARKETS: &[&str] = &[
    "walmart",
    "target",
    "costco",
    "kroger",
    "aldi",
    "lidl",
    "carrefour",
    "tesco",
    "sainsbury",
    "edeka",
    "rewe",
    "auchan",
    "leclerc",
    "mercadona",
    "jumbo",
    "albert heijn",
];

/// Extract candidate product rows from an arbitrary PDF price sheet.
///
/// Unreadable or scanned documents yield an empty batch; the caller
/// treats that as a per-document failure, never a batch failure.
pub fn extract(pdf_bytes: &[u8], filename: &str) -> Vec<RawRecord> {
    let text = match pdf_text::read_document(pdf_bytes) {
        PdfText::Text(text) => text,
        PdfText::Scanned => {
            warn!(file = filename, "scanned document — nothing to extract");
            return Vec::new();
        }
        PdfText::Unreadable(e) => {
            warn!(file = filename, error = %e, "unreadable document");
            return Vec::new();
        }
    };

    let market =
        market_from_filename(filename).unwrap_or_else(|| market_from_content(&text));

    let mut records = extract_candidates(&text);
    for rec in &mut records {
        rec.market = Some(market.clone());
        if rec.category.is_none() {
            let name = rec.name.as_deref().unwrap_or_default();
            rec.category = Some(infer_category(name, &text));
        }
    }
    info!(file = filename, market = %market, candidates = records.len(), "generic extraction done");
    records
}

/// Match the filename stem against the known market list; otherwise the
/// stem itself serves as the market name. `None` only for empty stems.
fn market_from_filename(filename: &str) -> Option<String> {
    let stem = filename
        .rsplit_once('.')
        .map_or(filename, |(stem, _)| stem)
        .trim();
    let lower = stem.to_lowercase();
    for market in KNOWN_MARKETS {
        if lower.contains(market) {
            return Some(title_case(market));
        }
    }
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Scan header/footer lines (first 3 + last 3), then the whole document,
/// for a known market name.
fn market_from_content(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut header_footer: Vec<&str> = lines.iter().take(3).copied().collect();
    header_footer.extend(lines.iter().rev().take(3).copied());
    let header_footer = header_footer.join(" ").to_lowercase();

    for market in KNOWN_MARKETS {
        if header_footer.contains(market) {
            return title_case(market);
        }
    }
    let whole = text.to_lowercase();
    for market in KNOWN_MARKETS {
        if whole.contains(market) {
            return title_case(market);
        }
    }
    "Unknown Market".to_string()
}

/// Run every name/price pattern plus the table-row heuristic over the
/// full text. Patterns are tried independently and all matches kept;
/// the duplicates this produces are resolved by the normalizer's dedup
/// stage, not here.
fn extract_candidates(text: &str) -> Vec<RawRecord> {
    let patterns = [
        r"([A-Za-z0-9][\w\s,&\-'.]+)\$(\d+\.\d{2})",
        r"([A-Za-z0-9][\w\s,&\-'.]+)\s*\$(\d+\.\d{2})",
        r"([A-Za-z0-9][\w\s,&\-'.]+)\s*\$\s*(\d+\.\d{2})",
        r"([A-Za-z0-9][\w\s,&\-'.]+)\s*(\d+\.\d{2})\s*\$",
        r"([A-Za-z0-9][\w\s,&\-'.]+)\s*\$\s*(\d+)",
    ];

    let mut records = Vec::new();
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        for cap in re.captures_iter(text) {
            push_candidate(&mut records, cap[1].trim(), &cap[2]);
        }
    }

    records.extend(extract_table_lines(text));
    records
}

/// Line-by-line heuristic for table-shaped price sheets: a qualifying
/// line has a currency marker and a run of three or more letters; cells
/// are split on runs of two or more spaces.
fn extract_table_lines(text: &str) -> Vec<RawRecord> {
    let alpha_re = Regex::new(r"[A-Za-z]{3,}").unwrap();
    let cell_re = Regex::new(r"\s{2,}").unwrap();
    let price_re = Regex::new(r"\$(\d+\.\d{2})").unwrap();

    let mut records = Vec::new();
    for line in text.lines() {
        if !line.contains('$') || !alpha_re.is_match(line) {
            continue;
        }
        let cells: Vec<&str> = cell_re.split(line).collect();
        if cells.len() < 2 {
            continue;
        }
        let mut name_parts: Vec<&str> = Vec::new();
        let mut price: Option<&str> = None;
        for cell in &cells {
            if let Some(cap) = price_re.captures(cell) {
                price = Some(cap.get(1).map_or("", |m| m.as_str()));
            } else if cell.trim().len() > 2 {
                name_parts.push(cell.trim());
            }
        }
        if let Some(price) = price {
            if !name_parts.is_empty() {
                push_candidate(&mut records, &name_parts.join(" "), price);
            }
        }
    }
    records
}

/// Apply the shared candidate filters: name length and price sanity.
fn push_candidate(records: &mut Vec<RawRecord>, name: &str, price: &str) {
    if name.chars().count() < 3 {
        return;
    }
    let Ok(price) = price.trim().parse::<f64>() else {
        return;
    };
    if price <= 0.0 || price > 10000.0 {
        return;
    }
    records.push(RawRecord {
        name: Some(name.to_string()),
        price: Some(price),
        ..Default::default()
    });
}

/// Category resolution order: keyword match on the name, then keyword
/// match over ±3 lines of context around the first occurrence of the
/// name, then an all-uppercase short line in that context taken as an
/// inferred section header.
fn infer_category(name: &str, text: &str) -> String {
    let by_name = classify::classify(name);
    if by_name != classify::DEFAULT_CATEGORY {
        return by_name.to_string();
    }

    let lines: Vec<&str> = text.lines().collect();
    if let Some(idx) = lines.iter().position(|line| line.contains(name)) {
        let start = idx.saturating_sub(3);
        let end = (idx + 4).min(lines.len());
        let context = &lines[start..end];

        let context_text = context.join(" ");
        if let Some(category) = classify::match_category(&context_text) {
            return category.to_string();
        }

        for line in context {
            let header = line.trim();
            let len = header.chars().count();
            if len > 3 && len < 30 && is_upper(header) && header != name {
                return header.to_string();
            }
        }
    }

    classify::DEFAULT_CATEGORY.to_string()
}

/// At least one alphabetic character, and none of them lowercase.
fn is_upper(s: &str) -> bool {
    let mut saw_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            saw_alpha = true;
            if c.is_lowercase() {
                return false;
            }
        }
    }
    saw_alpha
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
Walmart Weekly Price Sheet
DAIRY
Whole Milk Gallon $3.49
Cheddar Cheese Block $5.99
HARDWARE
Claw Hammer          $12.50
Socket Wrench Set    $24.99
";

    #[test]
    fn regex_passes_find_products() {
        let records = extract_candidates(SHEET);
        let names: Vec<&str> = records
            .iter()
            .filter_map(|r| r.name.as_deref())
            .collect();
        assert!(names.iter().any(|n| n.contains("Whole Milk")));
        assert!(names.iter().any(|n| n.contains("Claw Hammer")));
    }

    #[test]
    fn passes_accumulate_duplicates() {
        // Several of the five patterns match the same product; dedup is
        // deliberately left to the normalizer.
        let records = extract_candidates("Whole Milk Gallon $3.49\n");
        assert!(records.len() > 1);
    }

    #[test]
    fn table_line_heuristic_splits_on_wide_gaps() {
        let records = extract_table_lines("Socket Wrench Set    $24.99\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Socket Wrench Set"));
        assert_eq!(records[0].price, Some(24.99));
    }

    #[test]
    fn candidate_filters_apply() {
        let mut records = Vec::new();
        push_candidate(&mut records, "ab", "3.49"); // name too short
        push_candidate(&mut records, "Milk", "0"); // non-positive price
        push_candidate(&mut records, "Milk", "10000.01"); // above bound
        assert!(records.is_empty());
        push_candidate(&mut records, "Milk", "10000"); // inclusive upper bound here
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn market_prefers_known_names_then_stem() {
        assert_eq!(
            market_from_filename("walmart_prices_2025.pdf"),
            Some("Walmart".to_string())
        );
        assert_eq!(
            market_from_filename("cornershop.pdf"),
            Some("cornershop".to_string())
        );
        assert_eq!(market_from_filename(".pdf"), None);
    }

    #[test]
    fn market_from_header_then_whole_text() {
        assert_eq!(market_from_content("Tesco Price List\nitems\n"), "Tesco");
        let buried = "a\nb\nc\nd\nvisit aldi today\nf\ng\nh\ni\n";
        assert_eq!(market_from_content(buried), "Aldi");
        assert_eq!(market_from_content("no store here"), "Unknown Market");
    }

    #[test]
    fn category_from_name_keywords_first() {
        assert_eq!(infer_category("Cheddar Cheese Block", SHEET), "Groceries");
        assert_eq!(infer_category("Mystery Item", "nothing here"), "Uncategorized");
    }

    #[test]
    fn category_falls_back_to_uppercase_header() {
        // No keyword hits in the name or context, so the section header wins
        let sheet = "HARDWARE\nClaw Hammer $12.50\nWrench Set $24.99\n";
        assert_eq!(infer_category("Claw Hammer", sheet), "HARDWARE");
    }
}
