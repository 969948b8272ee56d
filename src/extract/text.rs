use regex::Regex;
use std::sync::LazyLock;

/// Two or more whitespace or space-separator characters
static REPEATED_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\p{Zs}]{2,}").expect("whitespace pattern is valid"));

/// Normalizes extracted text
///
/// Newlines become spaces, then every run of two or more whitespace or
/// Unicode space-separator characters collapses to a single space, then the
/// ends are trimmed.
///
/// # Examples
///
/// ```
/// use quarry::extract::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("a\n\nb   c"), "a b c");
/// assert_eq!(normalize_whitespace("  Title\u{00a0}\u{00a0}Here "), "Title Here");
/// ```
pub fn normalize_whitespace(input: &str) -> String {
    let without_newlines = input.replace('\n', " ");
    REPEATED_WHITESPACE
        .replace_all(&without_newlines, " ")
        .trim()
        .to_string()
}
