// src/store.rs

use crate::normalize::ProductRecord;
use rusqlite::{Connection, Result as SqliteResult, params};
use std::path::Path;
use tracing::info;

pub struct ProductStore {
    conn: Connection,
}

impl ProductStore {
    /// Open (or create) the product store and ensure the schema exists.
    pub fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                // Open surfaces the error if this fails
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS markets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                logo_url TEXT,
                website TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                price REAL NOT NULL,
                unit_price TEXT,
                category TEXT,
                market_id INTEGER REFERENCES markets(id),
                image_url TEXT,
                description TEXT,
                availability TEXT,
                regular_price REAL,
                discounted_price REAL,
                discount_percent REAL,
                discount_type TEXT,
                discount_period TEXT,
                last_updated TEXT,
                source_document TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_products_market_id ON products(market_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)",
            [],
        )?;

        info!("product store initialized");
        Ok(Self { conn })
    }

    /// Look up a market by name, creating the row if it does not exist.
    /// INSERT OR IGNORE + SELECT keeps the name-unique invariant under
    /// concurrent writers.
    pub fn get_or_create_market(&self, name: &str) -> SqliteResult<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO markets (name) VALUES (?1)",
            params![name],
        )?;
        self.conn
            .query_row("SELECT id FROM markets WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
    }

    /// Store a normalized table. Market rows are get-or-create keyed by
    /// name before the dependent products go in.
    pub fn upsert_records(&self, table: &[ProductRecord]) -> SqliteResult<usize> {
        let mut inserted = 0;
        for record in table {
            let market_id = self.get_or_create_market(&record.market)?;
            self.conn.execute(
                "INSERT INTO products
                    (name, price, unit_price, category, market_id, description, availability,
                     regular_price, discounted_price, discount_percent, discount_type,
                     discount_period, last_updated, source_document)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    record.name,
                    record.price,
                    record.unit_price,
                    record.category,
                    market_id,
                    record.description,
                    record.availability,
                    record.regular_price,
                    record.discounted_price,
                    record.discount_percent,
                    record.discount_type,
                    record.discount_period,
                    record.last_updated,
                    record.source_document,
                ],
            )?;
            inserted += 1;
        }
        info!(rows = inserted, "products stored");
        Ok(inserted)
    }

    /// Read back all products joined with their market names.
    pub fn fetch_all(&self) -> SqliteResult<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.name, p.price, p.unit_price, p.category, m.name, p.description,
                    p.availability, p.regular_price, p.discounted_price, p.discount_percent,
                    p.discount_type, p.discount_period, p.last_updated, p.source_document
             FROM products p
             JOIN markets m ON p.market_id = m.id
             ORDER BY p.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProductRecord {
                name: row.get(0)?,
                price: row.get(1)?,
                unit_price: row.get(2)?,
                category: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                market: row.get(4)?,
                description: row.get(5)?,
                availability: row.get(6)?,
                regular_price: row.get(7)?,
                discounted_price: row.get(8)?,
                discount_percent: row.get(9)?,
                discount_type: row.get(10)?,
                discount_period: row.get(11)?,
                last_updated: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
                source_document: row.get(13)?,
            })
        })?;
        rows.collect()
    }

    /// Row counts for the stats command.
    pub fn get_counts(&self) -> SqliteResult<(usize, usize)> {
        let markets: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM markets", [], |row| row.get(0))?;
        let products: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok((markets, products))
    }
}
