use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// The request that produced a page, as seen by templates (`request.*`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestInfo {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    /// Link distance from the start URL
    pub depth: u32,
}

impl RequestInfo {
    /// Describes a GET request for `url`
    pub fn get(url: &Url, headers: BTreeMap<String, String>, depth: u32) -> Self {
        Self {
            url: url.to_string(),
            method: "GET".to_string(),
            headers,
            depth,
        }
    }
}

/// The response of a page, as seen by templates (`response.*`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseInfo {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
}

/// Values a field template is evaluated against
///
/// HTML fields see empty `text` and `meta`; PDF fields see the normalized
/// document text and its metadata.
#[derive(Debug, Serialize)]
pub struct TemplateContext<'a> {
    pub request: &'a RequestInfo,
    pub response: Option<&'a ResponseInfo>,
    pub text: &'a str,
    pub meta: &'a BTreeMap<String, String>,
}

impl<'a> TemplateContext<'a> {
    /// Context for an HTML page
    pub fn html(
        request: &'a RequestInfo,
        response: Option<&'a ResponseInfo>,
        empty_meta: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            request,
            response,
            text: "",
            meta: empty_meta,
        }
    }

    /// Context for a PDF document
    pub fn pdf(
        request: &'a RequestInfo,
        response: Option<&'a ResponseInfo>,
        text: &'a str,
        meta: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            request,
            response,
            text,
            meta,
        }
    }
}
