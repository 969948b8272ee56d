use crate::url::canonical_key;
use url::Url;

/// A URL that has been claimed by the frontier
///
/// Created once when the URL is first offered and consumed once when it is
/// dispatched to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The URL to fetch, fragment removed
    pub url: Url,

    /// Dedup key in the visited set
    pub key: String,

    /// Link distance from the start URL
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        let key = canonical_key(&url);
        Self { url, key, depth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_fragment_and_host_case() {
        let a = FrontierEntry::new(Url::parse("https://Example.com/page#one").unwrap(), 0);
        let b = FrontierEntry::new(Url::parse("https://example.com/page#two").unwrap(), 3);

        assert_eq!(a.key, b.key);
        assert_eq!(a.key, "https://example.com/page");
        assert_eq!(b.depth, 3);
    }
}
