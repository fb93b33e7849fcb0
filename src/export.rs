// src/export.rs

use crate::normalize::ProductRecord;
use std::path::Path;
use tracing::info;

/// Write the canonical table to a UTF-8 comma-separated file with a
/// header row.
pub fn export_csv<P: AsRef<Path>>(
    table: &[ProductRecord],
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    for record in table {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(rows = table.len(), file = %path.display(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows_are_written() {
        let record = ProductRecord {
            name: "Milk 1L".to_string(),
            price: 45.0,
            unit_price: Some("100 гр = 7.5".to_string()),
            category: "Dairy".to_string(),
            market: "Kam".to_string(),
            description: None,
            availability: Some("Да".to_string()),
            regular_price: None,
            discounted_price: None,
            discount_percent: None,
            discount_type: None,
            discount_period: None,
            last_updated: "2025-03-05".to_string(),
            source_document: None,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_csv(&[record], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().starts_with("name,price,unit_price"));
        let row = lines.next().unwrap();
        assert!(row.contains("Milk 1L"));
        assert!(row.contains("45.0"));
        assert!(row.contains("Kam"));
    }
}
