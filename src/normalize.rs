// src/normalize.rs

use crate::classify;
use crate::extract::{RawRecord, today_iso};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::info;

/// A canonical product record. Immutable once normalization completes;
/// downstream consumers read it as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub name: String,
    pub price: f64,
    pub unit_price: Option<String>,
    pub category: String,
    pub market: String,
    pub description: Option<String>,
    pub availability: Option<String>,
    pub regular_price: Option<f64>,
    pub discounted_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub discount_type: Option<String>,
    pub discount_period: Option<String>,
    pub last_updated: String,
    pub source_document: Option<String>,
}

/// Synonym → canonical category mapping, applied by exact match after
/// title-casing. No substring matching at this stage.
const CATEGORY_SYNONYMS: &[(&str, &str)] = &[
    ("Electronic", "Electronics"),
    ("Electronics & Computers", "Electronics"),
    ("Computer", "Electronics"),
    ("Tv", "Electronics"),
    ("Phone", "Electronics"),
    ("Grocery", "Groceries"),
    ("Food", "Groceries"),
    ("Food Items", "Groceries"),
    ("Fruit", "Produce"),
    ("Fruits", "Produce"),
    ("Vegetables", "Produce"),
    ("Vegetable", "Produce"),
    ("Fresh Produce", "Produce"),
    ("Meats", "Meat & Seafood"),
    ("Seafood", "Meat & Seafood"),
    ("Fish", "Meat & Seafood"),
    ("Dairy Products", "Dairy"),
    ("Baked Goods", "Bakery"),
    ("Bread", "Bakery"),
    ("Drinks", "Beverages"),
    ("Soda", "Beverages"),
    ("Water", "Beverages"),
    ("Coffee & Tea", "Beverages"),
    ("Alcohol", "Beverages"),
    ("Cleaning", "Household"),
    ("Household Items", "Household"),
    ("Household Supplies", "Household"),
    ("Personal", "Personal Care"),
    ("Beauty", "Personal Care"),
    ("Health", "Personal Care"),
    ("Health & Beauty", "Personal Care"),
    ("Clothes", "Clothing"),
    ("Apparel", "Clothing"),
    ("Home", "Home & Garden"),
    ("Garden", "Home & Garden"),
    ("Furniture", "Home & Garden"),
    ("Decor", "Home & Garden"),
    ("Baby Products", "Baby"),
    ("Baby Items", "Baby"),
    ("Pet Supplies", "Pet"),
    ("Pet Food", "Pet"),
    ("Toys", "Toys & Games"),
    ("Games", "Toys & Games"),
    ("Sports", "Sports & Outdoors"),
    ("Outdoors", "Sports & Outdoors"),
    ("Fitness", "Sports & Outdoors"),
];

/// Combine extractor batches into the canonical table.
///
/// Stages run strictly in order over the whole batch: combine, clean,
/// deduplicate, standardize categories. All-or-nothing: no record leaves
/// this function partially normalized.
pub fn normalize(batches: Vec<Vec<RawRecord>>) -> Vec<ProductRecord> {
    let combined: Vec<RawRecord> = batches.into_iter().flatten().collect();
    let total = combined.len();

    let cleaned = clean(combined);
    let deduped = dedup(cleaned);
    let table = standardize_categories(deduped);

    info!(candidates = total, rows = table.len(), "normalization complete");
    table
}

/// Title-case in the Python `str.title` sense: a letter is uppercased
/// whenever it follows a non-letter, lowercased otherwise. "milk 1l"
/// becomes "Milk 1L".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Clean field values and drop rows that are missing essentials or
/// carry suspicious prices.
fn clean(rows: Vec<RawRecord>) -> Vec<ProductRecord> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(name) = row.name else { continue };
        let name = title_case(name.to_lowercase().trim());
        if name.is_empty() {
            continue;
        }
        let Some(market) = row.market else { continue };
        let market = title_case(&market);
        if market.is_empty() {
            continue;
        }
        let Some(price) = row.price else { continue };
        if !(price > 0.0 && price < 10000.0) {
            continue;
        }
        out.push(ProductRecord {
            name,
            price,
            unit_price: row.unit_price,
            category: row.category.unwrap_or_default(),
            market,
            description: row.description,
            availability: row.availability,
            regular_price: row.regular_price,
            discounted_price: row.discounted_price,
            discount_percent: row.discount_percent,
            discount_type: row.discount_type,
            discount_period: row.discount_period,
            last_updated: row.last_updated.unwrap_or_else(today_iso),
            source_document: row.source_document,
        });
    }
    out
}

/// One record per (name, market): sort by market then ascending price
/// (stable, so input order breaks ties), keep the first occurrence.
fn dedup(mut rows: Vec<ProductRecord>) -> Vec<ProductRecord> {
    rows.sort_by(|a, b| {
        a.market
            .cmp(&b.market)
            .then(a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal))
    });
    let mut seen: HashSet<(String, String)> = HashSet::new();
    rows.retain(|row| seen.insert((row.name.clone(), row.market.clone())));
    rows
}

/// Fill missing categories, title-case, and fold synonyms into the
/// canonical vocabulary by exact match.
fn standardize_categories(mut rows: Vec<ProductRecord>) -> Vec<ProductRecord> {
    for row in &mut rows {
        let mut category = if row.category.trim().is_empty() {
            classify::DEFAULT_CATEGORY.to_string()
        } else {
            title_case(&row.category)
        };
        if let Some((_, canonical)) = CATEGORY_SYNONYMS.iter().find(|(v, _)| *v == category) {
            category = (*canonical).to_string();
        }
        row.category = category;
    }
    rows
}
