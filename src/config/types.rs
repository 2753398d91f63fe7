use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Listing-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub postcodes: PostcodeConfig,
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Sites that will actually be queried
    pub fn enabled_sites(&self) -> impl Iterator<Item = &SiteConfig> {
        self.sites.iter().filter(|site| site.enabled)
    }
}

/// HTTP search endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port the search endpoint listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of front-end files served next to the search endpoint
    #[serde(rename = "static-dir", default)]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_port() -> u16 {
    8080
}

/// Location of the suburb/state/postcode datafile
#[derive(Debug, Clone, Deserialize)]
pub struct PostcodeConfig {
    /// Tab-separated postcode file
    pub path: String,
}

/// Scrape behaviour configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Maximum number of result pages walked per site
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum number of fetches in flight across the whole search
    #[serde(rename = "max-concurrent-fetches", default = "default_max_fetches")]
    pub max_concurrent_fetches: u32,

    /// Timeout for a single page request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Deadline for a whole search (seconds)
    #[serde(rename = "search-timeout-secs", default = "default_search_timeout")]
    pub search_timeout_secs: u64,
}

impl ScraperConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

fn default_max_fetches() -> u32 {
    16
}

fn default_request_timeout() -> u64 {
    30
}

fn default_search_timeout() -> u64 {
    90
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value as `Name/Version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// One listing site queried by the generic scraper
///
/// `search_url` carries the placeholders `{{suburb}}`, `{{state}}`,
/// `{{postCode}}` and `{{pageNo}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Selects the pager links whose text is a page number
    #[serde(rename = "page-link-selector")]
    pub page_link_selector: String,

    /// Selects one element per listing card
    #[serde(rename = "listing-selector")]
    pub listing_selector: String,

    /// Selects the price inside a listing card
    #[serde(rename = "price-selector")]
    pub price_selector: String,
}

fn default_enabled() -> bool {
    true
}
