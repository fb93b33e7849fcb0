// src/query.rs

use crate::normalize::ProductRecord;

/// Filter the canonical table. Omitted parameters impose no constraint;
/// price bounds are inclusive; an empty market list means "any market".
pub fn filter(
    table: &[ProductRecord],
    category: Option<&str>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    markets: Option<&[String]>,
) -> Vec<ProductRecord> {
    table
        .iter()
        .filter(|row| category.is_none_or(|c| row.category == c))
        .filter(|row| min_price.is_none_or(|min| row.price >= min))
        .filter(|row| max_price.is_none_or(|max| row.price <= max))
        .filter(|row| {
            markets.is_none_or(|ms| ms.is_empty() || ms.iter().any(|m| *m == row.market))
        })
        .cloned()
        .collect()
}

/// Case-insensitive substring search over name, category, and market.
/// A row matches when any of the three fields contains the query.
pub fn search(table: &[ProductRecord], query: &str) -> Vec<ProductRecord> {
    let query = query.to_lowercase();
    table
        .iter()
        .filter(|row| {
            row.name.to_lowercase().contains(&query)
                || row.category.to_lowercase().contains(&query)
                || row.market.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, price: f64, category: &str, market: &str) -> ProductRecord {
        ProductRecord {
            name: name.to_string(),
            price,
            unit_price: None,
            category: category.to_string(),
            market: market.to_string(),
            description: None,
            availability: None,
            regular_price: None,
            discounted_price: None,
            discount_percent: None,
            discount_type: None,
            discount_period: None,
            last_updated: "2025-03-05".to_string(),
            source_document: None,
        }
    }

    fn table() -> Vec<ProductRecord> {
        vec![
            rec("Milk 1L", 12.0, "Dairy", "Kam"),
            rec("Milk 2L", 22.0, "Dairy", "Vero"),
            rec("Bread", 15.0, "Bakery", "Kam"),
            rec("Milkshake Mix", 18.0, "Beverages", "Stokomak"),
        ]
    }

    #[test]
    fn search_covers_name_category_and_market() {
        let table = table();
        let hits = search(&table, "milk");
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|r| r.name.to_lowercase().contains("milk")));

        let by_market = search(&table, "stokomak");
        assert_eq!(by_market.len(), 1);
        let by_category = search(&table, "bakery");
        assert_eq!(by_category.len(), 1);
    }

    #[test]
    fn filter_combines_price_range_and_market_set() {
        let table = table();
        let markets = vec!["Kam".to_string()];
        let hits = filter(&table, None, Some(10.0), Some(20.0), Some(&markets));
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.market == "Kam"));
        assert!(hits.iter().all(|r| (10.0..=20.0).contains(&r.price)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let table = table();
        let hits = filter(&table, None, Some(12.0), Some(22.0), None);
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn empty_market_list_imposes_no_constraint() {
        let table = table();
        let empty: Vec<String> = Vec::new();
        assert_eq!(filter(&table, None, None, None, Some(&empty)).len(), 4);
    }

    #[test]
    fn category_is_exact_match() {
        let table = table();
        assert_eq!(filter(&table, Some("Dairy"), None, None, None).len(), 2);
        assert_eq!(filter(&table, Some("dairy"), None, None, None).len(), 0);
    }
}
