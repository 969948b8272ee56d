//! String helpers registered on top of the minijinja built-ins
//!
//! These cover the common cases of the sprig function library: truncation,
//! whitespace handling, regex replacement, prefix/suffix tests and the
//! current time.

use crate::extract::normalize_whitespace;
use minijinja::{Environment, Error, ErrorKind, Value};
use regex::Regex;
use std::fmt::Write;

/// Registers every helper on the environment
pub fn register(env: &mut Environment<'static>) {
    env.add_filter("trunc", trunc);
    env.add_filter("nospace", nospace);
    env.add_filter("squish", squish);
    env.add_filter("regex_replace", regex_replace);
    env.add_test("has_prefix", has_prefix);
    env.add_test("has_suffix", has_suffix);
    env.add_function("now", now);
}

/// `{{ value | trunc(n) }}`: keeps the first `n` characters, or the last
/// `-n` characters when `n` is negative
fn trunc(value: Value, n: i64) -> String {
    let chars: Vec<char> = value.to_string().chars().collect();
    let len = chars.len() as i64;

    let range = if n >= 0 {
        0..n.min(len) as usize
    } else {
        (len + n).max(0) as usize..chars.len()
    };

    chars[range].iter().collect()
}

/// `{{ value | nospace }}`: removes all whitespace
fn nospace(value: Value) -> String {
    value
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// `{{ value | squish }}`: collapses whitespace the way extracted text is
fn squish(value: Value) -> String {
    normalize_whitespace(&value.to_string())
}

/// `{{ value | regex_replace(pattern, replacement) }}`
fn regex_replace(value: Value, pattern: String, replacement: String) -> Result<String, Error> {
    let regex = Regex::new(&pattern).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid regex '{}': {}", pattern, e),
        )
    })?;
    Ok(regex
        .replace_all(&value.to_string(), replacement.as_str())
        .into_owned())
}

/// `{% if value is has_prefix("x") %}`
fn has_prefix(value: Value, prefix: String) -> bool {
    value.to_string().starts_with(&prefix)
}

/// `{% if value is has_suffix(".pdf") %}`
fn has_suffix(value: Value, suffix: String) -> bool {
    value.to_string().ends_with(&suffix)
}

/// `{{ now() }}` or `{{ now("%Y-%m-%d") }}`: current UTC time
fn now(format: Option<String>) -> Result<String, Error> {
    let now = chrono::Utc::now();
    match format {
        None => Ok(now.to_rfc3339()),
        Some(format) => {
            let mut out = String::new();
            write!(out, "{}", now.format(&format)).map_err(|_| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("invalid time format '{}'", format),
                )
            })?;
            Ok(out)
        }
    }
}
