// src/pdf_text.rs

use lopdf::Document;
use tracing::{info, warn};

/// Result of attempting to pull text out of a PDF price sheet.
#[derive(Debug)]
pub enum PdfText {
    /// The document contains extractable text.
    Text(String),
    /// The document appears to be scanned / image-only.
    Scanned,
    /// The bytes could not be parsed as a PDF at all.
    Unreadable(String),
}

/// Minimum number of non-whitespace characters we expect from a real
/// text PDF. Below this threshold we treat it as scanned.
const MIN_TEXT_CHARS: usize = 30;

/// Read the full text of a PDF price sheet, pages concatenated with
/// line breaks preserved.
pub fn read_document(pdf_bytes: &[u8]) -> PdfText {
    let doc = match Document::load_mem(pdf_bytes) {
        Ok(d) => d,
        Err(e) => return PdfText::Unreadable(format!("failed to parse PDF: {e}")),
    };

    if looks_like_scanned(&doc) {
        info!("structural check: likely scanned / image-only");
        return PdfText::Scanned;
    }

    match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => {
            let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
            if meaningful < MIN_TEXT_CHARS {
                info!(chars = meaningful, "extracted text too short — treating as scanned");
                PdfText::Scanned
            } else {
                info!(chars = meaningful, "text extracted");
                PdfText::Text(text)
            }
        }
        Err(e) => {
            warn!(error = %e, "pdf-extract failed — may be scanned or corrupted");
            PdfText::Scanned
        }
    }
}

/// A page with XObject images but no Font resources is almost
/// certainly a scan. If most pages look like that, the whole
/// document does.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false; // can't tell, let text extraction try
    }

    let mut image_only = 0;
    for object_id in pages.values() {
        let Ok(page_dict) = doc.get_object(*object_id).and_then(|o| o.as_dict()) else {
            continue;
        };
        let has_fonts = resource_entry_nonempty(doc, page_dict, b"Font");
        let has_images = resource_entry_nonempty(doc, page_dict, b"XObject");
        if has_images && !has_fonts {
            image_only += 1;
        }
    }

    let ratio = image_only as f64 / pages.len() as f64;
    info!(
        total_pages = pages.len(),
        image_only = image_only,
        ratio = format!("{ratio:.2}"),
        "scanned-page analysis"
    );
    ratio >= 0.8
}

/// Does the page's Resources dictionary carry a non-empty entry under `key`?
fn resource_entry_nonempty(doc: &Document, page_dict: &lopdf::Dictionary, key: &[u8]) -> bool {
    page_dict
        .get(b"Resources")
        .ok()
        .and_then(|r| doc.dereference(r).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok())
        .and_then(|res| res.get(key).ok())
        .and_then(|e| doc.dereference(e).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok())
        .is_some_and(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_unreadable() {
        let result = read_document(b"this is not a pdf");
        assert!(matches!(result, PdfText::Unreadable(_)));
    }
}
