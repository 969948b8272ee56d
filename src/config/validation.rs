use crate::config::types::{Config, InputConfig, LimitConfig, OutputConfig, RequestConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: usize = 1024;

/// Upper bound on any configured delay or jitter (one day)
const MAX_DELAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Validates the entire configuration
///
/// Regex patterns, selectors and templates are checked when the config is
/// compiled, see [`Config::compile`](crate::config::Config::compile).
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_user_agent(&config.user_agent)?;
    validate_request_config(&config.request)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the user agent can be sent as a header value
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "userAgent must not contain control characters, got {:?}",
            user_agent
        )));
    }
    Ok(())
}

/// Validates request timing and limit rules
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.timeout_in_ms == 0 {
        return Err(ConfigError::Validation(
            "request.timeoutInMs must be greater than 0".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "request.workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.domain_glob.as_deref() == Some("")
        && (config.parallelism > 0 || config.delay_in_ms > 0 || config.random_delay_in_ms > 0)
    {
        return Err(ConfigError::Validation(
            "request.domainGlob is empty but the inline limit has settings".to_string(),
        ));
    }

    validate_delays("request", config.delay_in_ms, config.random_delay_in_ms)?;
    validate_delays(
        "request.defaultLimit",
        config.default_limit.delay_in_ms,
        config.default_limit.random_delay_in_ms,
    )?;

    for rule in &config.limits {
        validate_limit_rule(rule)?;
    }

    Ok(())
}

/// Validates a single limit rule
fn validate_limit_rule(rule: &LimitConfig) -> Result<(), ConfigError> {
    if rule.domain_glob.trim().is_empty() {
        return Err(ConfigError::Validation(
            "limit rule domainGlob cannot be empty".to_string(),
        ));
    }
    validate_delays(
        &format!("limit rule '{}'", rule.domain_glob),
        rule.delay_in_ms,
        rule.random_delay_in_ms,
    )
}

/// Validates a delay and its random extra stay within [`MAX_DELAY_MS`]
fn validate_delays(scope: &str, delay_ms: u64, random_delay_ms: u64) -> Result<(), ConfigError> {
    for (name, value) in [("delayInMs", delay_ms), ("randomDelayInMs", random_delay_ms)] {
        if value > MAX_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "{}.{} must be at most {}, got {}",
                scope, name, MAX_DELAY_MS, value
            )));
        }
    }
    Ok(())
}

/// Validates the start URL
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.start_url.is_empty() {
        return Err(ConfigError::Validation(
            "input.startUrl cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&config.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid startUrl '{}': {}", config.start_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "startUrl '{}' must use HTTP or HTTPS",
            config.start_url
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.filename.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.filename cannot be empty".to_string(),
        ));
    }
    Ok(())
}
