// src/extract/web.rs

use super::{RawRecord, clean_price_text, today_iso};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{info, warn};

/// Vero online price list (table-row layout).
pub const VERO_URL: &str = "https://pricelist.vero.com.mk/91_2.html";

/// Stokomak price-check page (multi-table layout).
pub const STOKOMAK_URL: &str = "https://stokomak.com.mk/proverka-na-ceni/";

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.text().await
}

/// Fetch and parse the Vero catalog. A failed fetch yields an empty
/// batch; it must not abort sibling sources.
pub async fn scrape_vero(client: &reqwest::Client, url: &str) -> Vec<RawRecord> {
    match fetch(client, url).await {
        Ok(html) => parse_vero(&html, url),
        Err(e) => {
            warn!(url = url, error = %e, "Vero fetch failed");
            Vec::new()
        }
    }
}

/// Fetch and parse the Stokomak catalog.
pub async fn scrape_stokomak(client: &reqwest::Client, url: &str) -> Vec<RawRecord> {
    match fetch(client, url).await {
        Ok(html) => parse_stokomak(&html),
        Err(e) => {
            warn!(url = url, error = %e, "Stokomak fetch failed");
            Vec::new()
        }
    }
}

/// Vero layout: one big table; a row whose first cell is a header cell
/// names the category for the rows that follow it.
pub fn parse_vero(html: &str, url: &str) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse("tr").unwrap();
    let th_sel = Selector::parse("th").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let today = today_iso();
    let mut current_category = String::from("General");
    let mut records = Vec::new();

    for row in doc.select(&row_sel) {
        if let Some(th) = row.select(&th_sel).next() {
            let heading = element_text(&th);
            if !heading.is_empty() {
                current_category = heading;
            }
            continue;
        }

        let cells: Vec<_> = row.select(&td_sel).collect();
        if cells.len() < 2 {
            continue;
        }
        let name = element_text(&cells[0]);
        let Some(price) = clean_price_text(&element_text(&cells[cells.len() - 1])) else {
            continue;
        };
        if price <= 0.0 || price >= 1_000_000.0 {
            continue;
        }
        records.push(RawRecord {
            name: Some(name),
            price: Some(price),
            category: Some(current_category.clone()),
            market: Some("Vero".to_string()),
            availability: Some("Yes".to_string()),
            regular_price: Some(price),
            last_updated: Some(today.clone()),
            source_document: Some(url.to_string()),
            ..Default::default()
        });
    }

    info!(rows = records.len(), "Vero parse done");
    records
}

/// Stokomak layout: three tiers, stopping at the first that yields rows.
/// 1. marked tables with nearest-preceding-heading categories;
/// 2. inline JSON fragments in script blocks;
/// 3. line heuristics over the plain-text rendering.
pub fn parse_stokomak(html: &str) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);

    let mut records = parse_stokomak_tables(&doc);
    if records.is_empty() {
        records = parse_stokomak_scripts(&doc);
    }
    if records.is_empty() {
        records = parse_stokomak_text(&page_text(&doc));
    }
    info!(rows = records.len(), "Stokomak parse done");
    records
}

fn parse_stokomak_tables(doc: &Html) -> Vec<RawRecord> {
    // A single walk in document order: headings update the category
    // context, marked tables consume it.
    let walk_sel = Selector::parse("h2, h3, h4, table.table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let today = today_iso();
    let mut current_heading: Option<String> = None;
    let mut records = Vec::new();

    for element in doc.select(&walk_sel) {
        if element.value().name() != "table" {
            let heading = element_text(&element);
            if !heading.is_empty() {
                current_heading = Some(heading);
            }
            continue;
        }

        let category = current_heading.clone().unwrap_or_else(|| "General".to_string());
        // First row is the header
        for row in element.select(&row_sel).skip(1) {
            let cells: Vec<_> = row.select(&td_sel).collect();
            if cells.len() < 2 {
                continue;
            }
            let name = element_text(&cells[0]);
            let Some(price) = clean_price_text(&element_text(&cells[1])) else {
                continue;
            };
            records.push(stokomak_record(name, price, &category, &today));
        }
    }
    records
}

fn parse_stokomak_scripts(doc: &Html) -> Vec<RawRecord> {
    let script_sel = Selector::parse("script").unwrap();
    let object_re = Regex::new(r#"\{.*"productName".*\}"#).unwrap();

    let today = today_iso();
    let mut records = Vec::new();
    for script in doc.select(&script_sel) {
        let content: String = script.text().collect();
        if !content.contains("productName") {
            continue;
        }
        let Some(fragment) = object_re.find(&content) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(fragment.as_str()) else {
            continue;
        };
        let name = value
            .get("productName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let Some(price) = json_price(value.get("price")) else {
            continue;
        };
        records.push(stokomak_record(name, price, "General", &today));
    }
    records
}

/// Inline JSON carries prices either as numbers or as strings.
fn json_price(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

/// Free-text tier: short or all-uppercase lines become category
/// headings, "name number ден" lines become products under them.
pub fn parse_stokomak_text(text: &str) -> Vec<RawRecord> {
    let product_re = Regex::new(r"(.*?)\s+(\d+[.,]?\d*)\s*ден").unwrap();

    let today = today_iso();
    let mut current_category = String::from("General");
    let mut records = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_all_uppercase(line) || (line.chars().count() < 40 && !line.ends_with("ден")) {
            current_category = line.to_string();
            continue;
        }
        let Some(cap) = product_re.captures(line) else {
            continue;
        };
        let name = cap[1].trim().to_string();
        let Some(price) = cap[2].replace(',', ".").parse::<f64>().ok() else {
            continue;
        };
        records.push(stokomak_record(name, price, &current_category, &today));
    }
    records
}

fn stokomak_record(name: String, price: f64, category: &str, today: &str) -> RawRecord {
    RawRecord {
        name: Some(name),
        price: Some(price),
        category: Some(category.to_string()),
        market: Some("Stokomak".to_string()),
        last_updated: Some(today.to_string()),
        ..Default::default()
    }
}

fn element_text(element: &scraper::ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Plain-text rendering of the page body, scripts and styles excluded.
fn page_text(doc: &Html) -> String {
    let body_sel = Selector::parse("body").unwrap();
    let skip_sel = Selector::parse("script, style").unwrap();

    let mut skipped = String::new();
    for element in doc.select(&skip_sel) {
        skipped.push_str(&element.text().collect::<String>());
    }

    let Some(body) = doc.select(&body_sel).next() else {
        return String::new();
    };
    body.text()
        .filter(|chunk| !chunk.trim().is_empty() && !skipped.contains(chunk.trim()))
        .map(|chunk| chunk.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_all_uppercase(s: &str) -> bool {
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

    #[test]
    fn vero_rows_follow_header_categories() {
        let html = r#"
            <table>
              <tr><th>Млечни производи</th></tr>
              <tr><td>Млеко 1л</td><td>ед.</td><td>45,50 ден</td></tr>
              <tr><td>Јогурт 500мл</td><td>ед.</td><td>32 ден</td></tr>
              <tr><th>Пијалоци</th></tr>
              <tr><td>Сок од портокал</td><td>ед.</td><td>бесплатно</td></tr>
            </table>"#;
        let records = parse_vero(html, VERO_URL);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("Млеко 1л"));
        assert_eq!(records[0].price, Some(45.5));
        assert_eq!(records[0].category.as_deref(), Some("Млечни производи"));
        assert_eq!(records[0].regular_price, Some(45.5));
        assert_eq!(records[0].source_document.as_deref(), Some(VERO_URL));
        assert_eq!(records[1].category.as_deref(), Some("Млечни производи"));
    }

    #[test]
    fn stokomak_tier_one_takes_category_from_preceding_heading() {
        let html = r#"
            <h3>Основни продукти</h3>
            <table class="table">
              <tr><th>Производ</th><th>Цена</th></tr>
              <tr><td>Леб бел</td><td>33 ден</td></tr>
              <tr><td>Шеќер 1кг</td><td>54,90</td></tr>
            </table>
            <table class="table">
              <tr><th>Производ</th><th>Цена</th></tr>
              <tr><td>Масло 1л</td><td>99</td></tr>
            </table>"#;
        let records = parse_stokomak(html);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name.as_deref(), Some("Леб бел"));
        assert_eq!(records[0].price, Some(33.0));
        assert_eq!(records[0].category.as_deref(), Some("Основни продукти"));
        assert_eq!(records[1].price, Some(54.9));
        // Second table reuses the same preceding heading
        assert_eq!(records[2].category.as_deref(), Some("Основни продукти"));
    }

    #[test]
    fn stokomak_tier_two_reads_script_json() {
        let html = r#"
            <div>no marked tables here</div>
            <script>
              var product = {"productName": "Кисела вода", "price": "28.5"};
            </script>"#;
        let records = parse_stokomak(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Кисела вода"));
        assert_eq!(records[0].price, Some(28.5));
        assert_eq!(records[0].category.as_deref(), Some("General"));
    }

    #[test]
    fn stokomak_tier_three_line_heuristics() {
        let text = "МЛЕЧНИ ПРОИЗВОДИ И ЈАЈЦА РАЗЛАДЕНИ ВО ВИТРИНА\nКравјо млеко свежо пастеризирано 1л пакување во тетрапак 65,50 ден\n";
        let records = parse_stokomak_text(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, Some(65.5));
        assert_eq!(
            records[0].category.as_deref(),
            Some("МЛЕЧНИ ПРОИЗВОДИ И ЈАЈЦА РАЗЛАДЕНИ ВО ВИТРИНА")
        );
    }

    #[test]
    fn unparseable_price_skips_row_only() {
        let html = r#"
            <table class="table">
              <tr><th>h</th></tr>
              <tr><td>Производ без цена</td><td>--</td></tr>
              <tr><td>Јаболка</td><td>60</td></tr>
            </table>"#;
        let records = parse_stokomak(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("Јаболка"));
    }
}
