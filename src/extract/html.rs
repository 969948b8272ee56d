//! HTML field extraction and link discovery

use super::text::normalize_whitespace;
use crate::url::resolve_link;
use scraper::{Html, Selector};
use url::Url;

/// A comma-separated list of CSS selectors
///
/// Matches are collected selector by selector in list order, so
/// `"footer, header"` yields footer text before header text even though the
/// header comes first in the document. Within one selector, matches follow
/// document order.
#[derive(Debug, Clone)]
pub struct SelectorSpec {
    source: String,
    parts: Vec<Selector>,
}

impl SelectorSpec {
    /// Parses every sub-selector of `spec`
    ///
    /// Empty sub-selectors (e.g. from a trailing comma) are skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorSpec)` - All sub-selectors parsed
    /// * `Err(String)` - Message for the first sub-selector that failed
    pub fn parse(spec: &str) -> Result<Self, String> {
        let parts = spec
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                Selector::parse(part).map_err(|e| format!("'{}': {:?}", part, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: spec.to_string(),
            parts,
        })
    }

    /// The selector text as configured
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Returns the normalized text of every match, in sub-selector order
pub fn child_texts(document: &Html, spec: &SelectorSpec) -> Vec<String> {
    spec.parts
        .iter()
        .flat_map(|selector| document.select(selector))
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Extracts one field: all matched fragments joined with a single space
///
/// # Example
///
/// ```
/// use quarry::extract::html::{extract_field, SelectorSpec};
/// use scraper::Html;
///
/// let html = Html::parse_document(
///     "<html><body><header>Top</header><footer>Bottom</footer></body></html>",
/// );
/// let spec = SelectorSpec::parse("footer, header").unwrap();
/// assert_eq!(extract_field(&html, &spec), "Bottom Top");
/// ```
pub fn extract_field(document: &Html, spec: &SelectorSpec) -> String {
    child_texts(document, spec).join(" ")
}

/// Finds every `a[href]` on the page, resolved against `base_url`
///
/// Links that cannot be crawled (`mailto:`, `javascript:`, fragment-only,
/// non-HTTP schemes) are dropped. Fragments are stripped.
pub fn discover_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}
