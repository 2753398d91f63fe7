//! Listing scrape pipeline
//!
//! This module contains the core of a search:
//! - Price parsing and averaging
//! - Listing and pager extraction from result pages
//! - HTTP fetching behind the `Fetch` seam
//! - Page and site workers, fanned out as tokio tasks
//! - The orchestrator that folds everything into one `AggregateResult`

mod context;
mod extract;
mod fetcher;
mod orchestrator;
mod page;
mod price;
mod results;
mod site;

pub use context::{FetchOutcome, ScrapeContext};
pub use extract::{
    discover_document_page_count, discover_page_count, extract_document, extract_page,
    SiteSelectors,
};
pub use fetcher::{build_http_client, Fetch, HttpFetcher, PageDocument};
pub use orchestrator::{ScrapeRequest, Scraper, ScraperOptions};
pub use page::{page_url, scrape_page};
pub use price::{average_price, extract_price, MAX_PRICE, MIN_PRICE};
pub use results::{AggregateResult, PageOutcome, PageResult, SiteResult, SiteStatus, SiteSummary};
pub use site::scrape_site;
