use url::Url;

/// Returns the key a URL is grouped by for rate limiting
///
/// This is the lowercase host, followed by `:port` when the URL carries a
/// non-default port.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use quarry::url::host_key;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Checks if a host matches a glob pattern
///
/// Supported wildcards:
/// - `*` matches any sequence of characters, including none and including dots
/// - `?` matches exactly one character
///
/// Everything else matches literally, ignoring ASCII case.
///
/// # Examples
///
/// ```
/// use quarry::url::glob_matches;
///
/// assert!(glob_matches("*", "example.com"));
/// assert!(glob_matches("*.example.com", "blog.example.com"));
/// assert!(!glob_matches("*.example.com", "example.com"));
/// assert!(glob_matches("*example.com*", "example.com:8080"));
/// assert!(glob_matches("host-?.internal", "host-7.internal"));
/// ```
pub fn glob_matches(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.to_ascii_lowercase().chars().collect();
    let candidate: Vec<char> = candidate.to_ascii_lowercase().chars().collect();

    // Iterative wildcard match with single-star backtracking
    let (mut p, mut c) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while c < candidate.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == candidate[c]) {
            p += 1;
            c += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, c));
            p += 1;
        } else if let Some((star_p, star_c)) = star {
            p = star_p + 1;
            c = star_c + 1;
            star = Some((star_p, star_c + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}
