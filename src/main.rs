mod classify;
mod config;
mod export;
mod extract;
mod normalize;
mod pdf_text;
mod query;
mod store;

use config::Config;
use extract::{RawRecord, web};
use std::path::{Path, PathBuf};
use std::time::Duration;
use store::ProductStore;
use tracing::{info, info_span, warn};

const CONFIG_PATH: &str = "price_compare.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let cfg = Config::load_or_default(CONFIG_PATH)?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("run") => cmd_run(&cfg).await?,
        Some("pdf") => cmd_pdf(&cfg, &args[1..])?,
        Some("kam") => cmd_kam(&cfg, &args[1..])?,
        Some("scrape") => cmd_scrape(&cfg).await?,
        Some("export") => cmd_export(&cfg, args.get(1).map(String::as_str))?,
        Some("search") => cmd_search(&cfg, args.get(1).map(String::as_str))?,
        Some("filter") => cmd_filter(&cfg, &args[1..])?,
        Some("stats") => cmd_stats(&cfg)?,
        Some(other) => {
            eprintln!("unknown command: {other}");
            eprintln!(
                "usage: price_compare [run | pdf <files..> | kam <file> [out.csv] | scrape \
                 | export <out.csv> | search <query> | filter [category=..] [min=..] [max=..] [market=..]* | stats]"
            );
        }
    }

    Ok(())
}

/// Full pipeline: every PDF in the configured directory plus both web
/// catalogs, normalized as one batch and stored.
async fn cmd_run(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut batches = Vec::new();
    let mut attempted = 0usize;
    let mut succeeded = 0usize;

    for path in pdf_paths(&cfg.pdf_dir) {
        attempted += 1;
        if let Some(rows) = extract_document(&path) {
            if !rows.is_empty() {
                succeeded += 1;
            }
            batches.push(rows);
        }
    }

    let client = http_client(cfg)?;
    let (vero, stokomak) = tokio::join!(
        web::scrape_vero(&client, &cfg.sources.vero_url),
        web::scrape_stokomak(&client, &cfg.sources.stokomak_url),
    );
    attempted += 2;
    succeeded += [&vero, &stokomak].iter().filter(|b| !b.is_empty()).count();
    batches.push(vero);
    batches.push(stokomak);

    let table = normalize::normalize(batches);
    info!(
        sources_attempted = attempted,
        sources_with_rows = succeeded,
        rows = table.len(),
        "pipeline complete"
    );

    store_table(cfg, &table);
    println!(
        "{} of {} sources yielded rows; {} normalized products",
        succeeded,
        attempted,
        table.len()
    );
    Ok(())
}

/// Extract the given PDF files, then normalize and store.
fn cmd_pdf(cfg: &Config, files: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if files.is_empty() {
        eprintln!("usage: price_compare pdf <files..>");
        return Ok(());
    }
    let mut batches = Vec::new();
    for file in files {
        if let Some(rows) = extract_document(Path::new(file)) {
            batches.push(rows);
        }
    }
    let table = normalize::normalize(batches);
    store_table(cfg, &table);
    println!("{} normalized products from {} files", table.len(), files.len());
    Ok(())
}

/// Extract a KAM price list; with a destination argument, export the
/// raw rows to CSV instead of storing.
fn cmd_kam(cfg: &Config, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let Some(file) = args.first() else {
        eprintln!("usage: price_compare kam <file> [out.csv]");
        return Ok(());
    };
    let bytes = std::fs::read(file)?;

    if let Some(dest) = args.get(1) {
        let ok = extract::kam::export(&bytes, Path::new(dest))?;
        println!(
            "{}",
            if ok { "export written" } else { "no rows extracted — nothing written" }
        );
        return Ok(());
    }

    let rows = extract::kam::extract(&bytes);
    let table = normalize::normalize(vec![rows]);
    store_table(cfg, &table);
    println!("{} normalized products", table.len());
    Ok(())
}

/// Scrape both web catalogs, normalize, and store.
async fn cmd_scrape(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = http_client(cfg)?;
    let (vero, stokomak) = tokio::join!(
        web::scrape_vero(&client, &cfg.sources.vero_url),
        web::scrape_stokomak(&client, &cfg.sources.stokomak_url),
    );
    let table = normalize::normalize(vec![vero, stokomak]);
    store_table(cfg, &table);
    println!("{} normalized products", table.len());
    Ok(())
}

/// Export everything in the store to a CSV file.
fn cmd_export(cfg: &Config, dest: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(dest) = dest else {
        eprintln!("usage: price_compare export <out.csv>");
        return Ok(());
    };
    let db = ProductStore::new(&cfg.db_path)?;
    let table = db.fetch_all()?;
    export::export_csv(&table, dest)?;
    println!("{} rows exported to {dest}", table.len());
    Ok(())
}

/// Search the stored table by substring over name, category, market.
fn cmd_search(cfg: &Config, q: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(q) = q else {
        eprintln!("usage: price_compare search <query>");
        return Ok(());
    };
    let db = ProductStore::new(&cfg.db_path)?;
    let table = db.fetch_all()?;
    for row in query::search(&table, q) {
        println!("{}\t{}\t{}\t{}", row.name, row.price, row.category, row.market);
    }
    Ok(())
}

/// Filter the stored table with key=value arguments; repeated
/// `market=` entries build the market set.
fn cmd_filter(cfg: &Config, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut category: Option<String> = None;
    let mut min_price: Option<f64> = None;
    let mut max_price: Option<f64> = None;
    let mut markets: Vec<String> = Vec::new();

    for arg in args {
        match arg.split_once('=') {
            Some(("category", v)) => category = Some(v.to_string()),
            Some(("min", v)) => min_price = v.parse().ok(),
            Some(("max", v)) => max_price = v.parse().ok(),
            Some(("market", v)) => markets.push(v.to_string()),
            _ => {
                eprintln!("ignoring unrecognized filter argument: {arg}");
            }
        }
    }

    let db = ProductStore::new(&cfg.db_path)?;
    let table = db.fetch_all()?;
    let hits = query::filter(
        &table,
        category.as_deref(),
        min_price,
        max_price,
        Some(&markets),
    );
    for row in &hits {
        println!("{}\t{}\t{}\t{}", row.name, row.price, row.category, row.market);
    }
    println!("{} of {} rows matched", hits.len(), table.len());
    Ok(())
}

fn cmd_stats(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = ProductStore::new(&cfg.db_path)?;
    let (markets, products) = db.get_counts()?;
    println!("{markets} markets, {products} products");
    Ok(())
}

/// Read and extract one PDF, picking the structured extractor for KAM
/// price lists by filename. `None` means the file was unreadable.
fn extract_document(path: &Path) -> Option<Vec<RawRecord>> {
    let span = info_span!("pdf", file = %path.display());
    let _guard = span.enter();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "unreadable file — skipping");
            return None;
        }
    };
    let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
    let rows = if filename.to_lowercase().contains("kam") {
        extract::kam::extract(&bytes)
    } else {
        extract::generic::extract(&bytes, filename)
    };
    info!(rows = rows.len(), "extracted");
    Some(rows)
}

/// Persistence failure is reported, never fatal: the extracted table is
/// still available to the caller.
fn store_table(cfg: &Config, table: &[normalize::ProductRecord]) {
    if table.is_empty() {
        return;
    }
    match ProductStore::new(&cfg.db_path).and_then(|db| db.upsert_records(table)) {
        Ok(inserted) => info!(inserted = inserted, "stored products"),
        Err(e) => warn!(error = %e, "persistence failed — extracted data was not stored"),
    }
}

fn pdf_paths(dir: &str) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = dir, error = %e, "price-list directory not readable");
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    paths.sort();
    paths
}

fn http_client(cfg: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_secs))
        .build()
}
