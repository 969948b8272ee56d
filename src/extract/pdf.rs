//! PDF text and metadata extraction

use super::text::normalize_whitespace;
use lopdf::{Document, Object};
use std::collections::BTreeMap;
use thiserror::Error;

/// Text substituted for a PDF that could not be converted
pub const PDF_SENTINEL: &str = "PDF could not be parsed";

/// Document information dictionary keys copied into the metadata map
const INFO_KEYS: &[&str] = &[
    "Title",
    "Author",
    "Subject",
    "Keywords",
    "Creator",
    "Producer",
    "CreationDate",
    "ModDate",
];

/// Errors from PDF conversion
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to extract text: {0}")]
    Text(String),

    #[error("failed to read document structure: {0}")]
    Structure(String),

    #[error("PDF parser panicked")]
    Panicked,
}

/// Plain text and metadata of a PDF document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfContent {
    /// Whitespace-normalized text of every page
    pub text: String,

    /// Info dictionary entries plus `Pages` and `PDFVersion`
    pub meta: BTreeMap<String, String>,
}

impl PdfContent {
    /// Content used when conversion fails: sentinel text, no metadata
    pub fn unparsed() -> Self {
        Self {
            text: PDF_SENTINEL.to_string(),
            meta: BTreeMap::new(),
        }
    }
}

/// Converts PDF bytes to text and metadata on the calling thread
pub fn extract_blocking(bytes: &[u8]) -> Result<PdfContent, PdfError> {
    let document = Document::load_mem(bytes).map_err(|e| PdfError::Structure(e.to_string()))?;
    let meta = read_metadata(&document);

    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| PdfError::Text(e.to_string()))?;

    Ok(PdfContent {
        text: normalize_whitespace(&text),
        meta,
    })
}

/// Converts PDF bytes to text and metadata on a blocking thread
///
/// A panic inside the PDF parser is reported as [`PdfError::Panicked`].
pub async fn extract(bytes: Vec<u8>) -> Result<PdfContent, PdfError> {
    tokio::task::spawn_blocking(move || extract_blocking(&bytes))
        .await
        .map_err(|_| PdfError::Panicked)?
}

/// Reads the document information dictionary
fn read_metadata(document: &Document) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();

    meta.insert("PDFVersion".to_string(), document.version.clone());
    meta.insert("Pages".to_string(), document.get_pages().len().to_string());

    let info = match document.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => document.get_object(*id).ok(),
        Ok(object) => Some(object),
        Err(_) => None,
    };

    if let Some(Object::Dictionary(dict)) = info {
        for key in INFO_KEYS {
            if let Ok(Object::String(raw, _)) = dict.get(key.as_bytes()) {
                let value = decode_pdf_string(raw);
                if !value.is_empty() {
                    meta.insert(key.to_string(), value);
                }
            }
        }
    }

    meta
}

/// Decodes a PDF text string
///
/// Strings starting with the UTF-16BE byte order mark are UTF-16; anything
/// else is treated as PDFDocEncoding, which matches Latin-1 for printable
/// characters.
fn decode_pdf_string(raw: &[u8]) -> String {
    let decoded = if let Some(utf16) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        raw.iter().map(|&b| b as char).collect()
    };

    decoded.trim_matches(char::from(0)).trim().to_string()
}
