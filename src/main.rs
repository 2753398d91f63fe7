//! Listing-Scout main entry point
//!
//! This is the command-line interface for the Listing-Scout price sampler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use listing_scout::config::{load_config_with_hash, Config};
use listing_scout::server::{serve, SearchRequest, SearchService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Listing-Scout: average asking prices for a suburb
///
/// Listing-Scout resolves a free-text location, queries every enabled
/// listing site for it in parallel and reports the average price across all
/// listings found.
#[derive(Parser, Debug)]
#[command(name = "listing-scout")]
#[command(version = "1.0.0")]
#[command(about = "Average asking prices for a suburb", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Validate config and show which sites would be queried without scraping
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one search and print the JSON response
    Search {
        /// Free-text location, e.g. "bondi beach nsw"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Pretty-print the JSON response
        #[arg(long)]
        pretty: bool,
    },

    /// Serve POST /search over HTTP (the default)
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    match cli.command {
        Some(Command::Search { text, pretty }) => {
            handle_search(&config, text.join(" "), pretty).await
        }
        Some(Command::Serve { port }) => handle_serve(&config, port).await,
        None => handle_serve(&config, None).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_scout=info,warn"),
            1 => EnvFilter::new("listing_scout=debug,info"),
            2 => EnvFilter::new("listing_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so `search` output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be queried
fn handle_dry_run(config: &Config) {
    println!("=== Listing-Scout Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Max pages per site: {}", config.scraper.max_pages);
    println!(
        "  Max concurrent fetches: {}",
        config.scraper.max_concurrent_fetches
    );
    println!("  Request timeout: {}s", config.scraper.request_timeout_secs);
    println!("  Search timeout: {}s", config.scraper.search_timeout_secs);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Postcodes: {}", config.postcodes.path);
    println!("Server port: {}", config.server.port);
    if let Some(dir) = &config.server.static_dir {
        println!("Static files: {}", dir);
    }

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        let marker = if site.enabled { "+" } else { "-" };
        println!("  {} {}", marker, site.name);
        println!("    url: {}", site.search_url);
        println!(
            "    selectors: pages '{}', listings '{}', price '{}'",
            site.page_link_selector, site.listing_selector, site.price_selector
        );
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Each search would query {} sites",
        config.enabled_sites().count()
    );
}

fn build_service(config: &Config) -> anyhow::Result<Arc<SearchService>> {
    let service = SearchService::from_config(config).context("Failed to start search service")?;
    Ok(Arc::new(service))
}

/// Handles a one-shot search from the command line
async fn handle_search(config: &Config, text: String, pretty: bool) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let response = service
        .search(SearchRequest {
            search_id: 1,
            search_text: text,
        })
        .await;

    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", json);

    Ok(())
}

/// Handles the HTTP server mode
async fn handle_serve(config: &Config, port: Option<u16>) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let port = port.unwrap_or(config.server.port);

    tracing::info!(
        "Serving searches across {} enabled sites",
        config.enabled_sites().count()
    );
    let static_dir = config.server.static_dir.as_deref().map(Path::new);
    if let Some(dir) = static_dir {
        tracing::info!("Serving front end from {}", dir.display());
    }

    serve(service, port, static_dir)
        .await
        .with_context(|| format!("Failed to serve on port {}", port))
}
