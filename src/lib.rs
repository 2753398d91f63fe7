//! Listing-Scout: a concurrent real-estate price sampler
//!
//! This crate queries several listing websites for a location, walks each
//! site's paginated results in parallel, extracts asking prices from the
//! listing cards, and folds everything into a single average price summary.

pub mod config;
pub mod listings;
pub mod location;
pub mod server;

use thiserror::Error;

/// Main error type for Listing-Scout operations
///
/// Only startup and transport-level failures surface as errors. Anything
/// that goes wrong while scraping degrades the result instead.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Postcode index error: {0}")]
    Postcodes(#[from] location::PostcodeError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for site '{site}': {message}")]
    InvalidSelector { site: String, message: String },
}

/// Failure to turn one URL into a queryable document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to get target url ({url}): {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Response status code error while fetching ({url}): {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of ({url}): {message}")]
    Body { url: String, message: String },
}

/// Result type alias for Listing-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, SiteConfig};
pub use listings::{AggregateResult, ScrapeRequest, Scraper, SiteResult, SiteStatus};
pub use location::{Location, LocationResolver, PostcodeIndex};
