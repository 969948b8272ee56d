//! Configuration module for Quarry
//!
//! This module handles loading, parsing, validating and compiling the crawl
//! configuration. A configuration can come from a JSON or TOML file, or as
//! JSON in the `CONFIG` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use quarry::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.json")).unwrap();
//! let compiled = config.compile().unwrap();
//! println!("Crawl starts at {}", compiled.config.input.start_url);
//! ```

mod compiled;
mod parser;
mod types;
mod validation;

// Re-export types
pub use compiled::CompiledConfig;
pub use types::{
    CacheConfig, Config, DefaultLimitConfig, FieldsConfig, InputConfig, LimitConfig,
    OutputConfig, PdfConfig, RequestConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_from_env, load_config_str, resolve_config,
    ConfigFormat, CONFIG_ENV,
};
