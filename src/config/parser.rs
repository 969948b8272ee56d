use crate::cache::sha256_hex;
use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Environment variable that may hold the whole configuration as JSON
pub const CONFIG_ENV: &str = "CONFIG";

/// Serialization format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from a file extension; anything but `.toml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Parses and validates a configuration document
///
/// # Arguments
///
/// * `content` - The raw configuration text
/// * `format` - Whether `content` is JSON or TOML
///
/// # Returns
///
/// * `Ok(Config)` - Successfully parsed and validated configuration
/// * `Err(ConfigError)` - Failed to parse or validate the configuration
pub fn load_config_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };

    validate(&config)?;

    Ok(config)
}

/// Loads and parses a configuration file from the given path
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use quarry::config::load_config;
///
/// let config = load_config(Path::new("config.json")).unwrap();
/// println!("Start URL: {}", config.input.start_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    load_config_str(&content, ConfigFormat::from_path(path))
}

/// Loads the configuration from the `CONFIG` environment variable
///
/// Returns `None` when the variable is not set. The value is always JSON,
/// which makes it easy to pass a config into a container.
pub fn load_config_from_env() -> Option<Result<(Config, String), ConfigError>> {
    let content = std::env::var(CONFIG_ENV).ok()?;
    Some(load_config_str(&content, ConfigFormat::Json).map(|config| {
        let hash = compute_config_hash(&content);
        (config, hash)
    }))
}

/// Computes a SHA-256 hash of the configuration content
///
/// The hash is logged at startup so separate runs can be matched to the
/// exact configuration they used.
pub fn compute_config_hash(content: &str) -> String {
    sha256_hex(content.as_bytes())
}

/// Resolves the configuration for a run
///
/// The `CONFIG` environment variable takes precedence over the file.
///
/// # Returns
///
/// * `Ok((Config, String))` - The configuration and the hash of its source text
/// * `Err(ConfigError)` - Failed to load or parse the configuration
pub fn resolve_config(path: &Path) -> Result<(Config, String), ConfigError> {
    if let Some(result) = load_config_from_env() {
        return result;
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = load_config_str(&content, ConfigFormat::from_path(path))?;
    Ok((config, compute_config_hash(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn create_temp_config(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const JSON_CONFIG: &str = r#"{
        "debug": false,
        "userAgent": "TestCrawler/1.0",
        "request": {
            "timeoutInMs": 5000,
            "domainGlob": "*example.com*",
            "parellelism": 2,
            "delayInMs": 250,
            "randomDelayInMs": 100
        },
        "input": {
            "startUrl": "https://example.com/",
            "urlFilters": ["https://example\\.com/.*"],
            "disallowedUrlFilters": [".*\\.png$"]
        },
        "Output": { "Filename": "out.jsonl" },
        "Html": { "Selectors": { "title": "h1", "url": "{{ request.url }}" } },
        "Pdf": { "Enabled": true, "Selectors": { "body": "{{ text }}" } }
    }"#;

    #[test]
    fn test_load_json_config_with_original_keys() {
        let file = create_temp_config(JSON_CONFIG, ".json");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.user_agent, "TestCrawler/1.0");
        assert_eq!(config.request.timeout_in_ms, 5000);
        assert_eq!(config.request.parallelism, 2);
        assert_eq!(config.request.domain_glob.as_deref(), Some("*example.com*"));
        assert_eq!(config.output.filename, "out.jsonl");
        assert_eq!(config.html.selectors.len(), 2);
        assert!(config.pdf.enabled);
        assert_eq!(config.input.disallowed_url_filters.len(), 1);
    }

    #[test]
    fn test_load_toml_config() {
        let config_content = r#"
userAgent = "TomlBot"

[request]
timeoutInMs = 2000
workers = 4

[[request.limits]]
domainGlob = "*"
parallelism = 1
delayInMs = 100

[input]
startUrl = "http://localhost/"

[output]
filename = "records.jsonl"

[html.selectors]
heading = "h1, h2"
"#;

        let file = create_temp_config(config_content, ".toml");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.user_agent, "TomlBot");
        assert_eq!(config.request.workers, 4);
        assert_eq!(config.request.limits.len(), 1);
        assert_eq!(config.request.limits[0].parallelism, 1);
        assert_eq!(config.html.selectors["heading"], "h1, h2");
        assert!(!config.pdf.enabled);
    }

    #[test]
    fn test_defaults_applied() {
        let config = load_config_str(
            r#"{"input": {"startUrl": "https://example.com/"}, "output": {"filename": "o.jsonl"}}"#,
            ConfigFormat::Json,
        )
        .unwrap();

        assert_eq!(config.request.timeout_in_ms, 10_000);
        assert_eq!(config.request.workers, 8);
        assert_eq!(config.request.default_limit.parallelism, 0);
        assert!(config.cache.responses);
        assert_eq!(config.cache.pdf_dir, "pdf-cache");
        assert!(config.request.limit_rules().is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_config_with_invalid_json() {
        let file = create_temp_config("this is not JSON {{{", ".json");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let result = load_config_str(
            r#"{"input": {"startUrl": "ftp://example.com/"}, "output": {"filename": "o.jsonl"}}"#,
            ConfigFormat::Json,
        );
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("config.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Json);
    }

    #[test]
    fn test_compute_config_hash() {
        let hash1 = compute_config_hash("content 1");
        let hash2 = compute_config_hash("content 1");
        let hash3 = compute_config_hash("content 2");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 64);
    }
}
