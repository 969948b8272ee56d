//! Content extraction for HTML pages and PDF documents
//!
//! - [`html`]: CSS selector evaluation and link discovery
//! - [`pdf`]: text and metadata conversion with a sentinel on failure
//! - [`fields`]: configured output fields (selector or template)
//!
//! Both extractors normalize text with [`normalize_whitespace`].

mod fields;
pub mod html;
pub mod pdf;
mod text;

pub use fields::{ExtractedDocument, Field, FieldSet, FieldSpec};
pub use pdf::{PdfContent, PdfError, PDF_SENTINEL};
pub use text::normalize_whitespace;
