use crate::ConfigError;
use regex::Regex;

/// Compiled allow/deny URL patterns
///
/// A URL is allowed when the allow-list is empty or at least one allow
/// pattern matches, and no deny pattern matches. Patterns are unanchored:
/// they match anywhere in the URL unless they anchor themselves with `^`/`$`.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

impl UrlFilter {
    /// Compiles allow and deny pattern lists
    ///
    /// # Returns
    ///
    /// * `Ok(UrlFilter)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - The first pattern that failed to compile
    pub fn new(allow: &[String], deny: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            allow: compile_patterns(allow)?,
            deny: compile_patterns(deny)?,
        })
    }

    /// A filter that allows every URL
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks whether a URL may be crawled
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry::url::UrlFilter;
    ///
    /// let filter = UrlFilter::new(&[], &[r".*\.png$".to_string()]).unwrap();
    /// assert!(filter.allows("http://x/a.html"));
    /// assert!(!filter.allows("http://x/a.png"));
    /// ```
    pub fn allows(&self, url: &str) -> bool {
        if self.deny.iter().any(|pattern| pattern.is_match(url)) {
            return false;
        }

        self.allow.is_empty() || self.allow.iter().any(|pattern| pattern.is_match(url))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}
