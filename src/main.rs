//! Quarry main entry point
//!
//! This is the command-line interface for the Quarry record crawler.

use anyhow::Context;
use clap::Parser;
use quarry::config::{resolve_config, CompiledConfig, CONFIG_ENV};
use quarry::crawler::{crawl, RunMode};
use quarry::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quarry: a configuration-driven record crawler
///
/// Quarry crawls a site from its start URL, extracts the configured fields
/// from every HTML page and linked PDF, and writes one JSON record per page.
/// The configuration is read from the CONFIG environment variable when set,
/// otherwise from the --config file.
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(version)]
#[command(about = "A configuration-driven record crawler", long_about = None)]
struct Cli {
    /// Path to the JSON or TOML configuration file
    #[arg(short, long, value_name = "PATH", default_value = "config.json")]
    config: PathBuf,

    /// Fetch a single URL, print its record and exit without following links
    #[arg(long, value_name = "URL", conflicts_with = "dry_run")]
    test_url: Option<String>,

    /// Validate the configuration, show what would be crawled and exit
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let source = if std::env::var_os(CONFIG_ENV).is_some() {
        format!("${}", CONFIG_ENV)
    } else {
        cli.config.display().to_string()
    };
    let (config, config_hash) = resolve_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", source))?;

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, config.debug);
    tracing::info!("Configuration loaded from {} (hash: {})", source, config_hash);

    let config = config
        .compile()
        .context("Failed to compile configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let mode = match cli.test_url {
        Some(url) => RunMode::Test { url },
        None => RunMode::Crawl,
    };

    handle_crawl(config, mode).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that test-mode records on stdout stay parseable.
/// The config `debug` flag raises the default level to debug.
fn setup_logging(verbose: u8, quiet: bool, debug: bool) {
    let verbose = if debug { verbose.max(1) } else { verbose };
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("quarry=info,warn"),
            1 => EnvFilter::new("quarry=debug,info"),
            2 => EnvFilter::new("quarry=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what the configuration resolves to
fn handle_dry_run(config: &CompiledConfig) {
    let raw = &config.config;

    println!("=== Quarry Dry Run ===\n");

    println!("Input:");
    println!("  Start URL: {}", raw.input.start_url);
    println!("  Allow patterns: {}", raw.input.url_filters.len());
    println!("  Deny patterns: {}", raw.input.disallowed_url_filters.len());
    println!(
        "  Start URL allowed: {}",
        if config.filter.allows(&raw.input.start_url) { "yes" } else { "NO" }
    );

    println!("\nRequests:");
    println!("  Workers: {}", raw.request.workers);
    println!("  Timeout: {:?}", config.timeout());
    for rule in config.limits.rules() {
        println!("  Limit: {}", rule);
    }
    println!("  Unmatched hosts: {}", config.limits.default_rule());

    println!("\nFields:");
    for field in config.html_fields.iter() {
        println!("  html.{}", field.name);
    }
    if config.pdf_enabled() {
        for field in config.pdf_fields.iter() {
            println!("  pdf.{}", field.name);
        }
    } else {
        println!("  (PDF extraction disabled)");
    }

    println!("\nOutput: {}", raw.output.filename);
    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: CompiledConfig, mode: RunMode) -> anyhow::Result<()> {
    if let RunMode::Test { url } = &mode {
        tracing::info!("Test mode: processing {} only", url);
    }
    let test_mode = mode != RunMode::Crawl;

    // Run the crawler
    match crawl(config, mode).await {
        Ok(stats) => {
            tracing::info!("Crawl completed successfully");
            if !test_mode {
                print_statistics(&stats);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
