use crate::config::{Config, SiteConfig};
use crate::listings::{AggregateResult, ScrapeRequest, Scraper, SiteSummary};
use crate::location::{Location, LocationResolver, PostcodeIndex};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A search as submitted by the search form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_id: i64,
    pub search_text: String,
}

/// The answer sent back for one search
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub request: SearchRequest,
    pub suburb: String,
    pub state: String,
    pub post_code: String,
    pub avg_price: u64,
    pub price_count: usize,
    pub listing_count: usize,
    pub site_count: usize,
    pub page_count: u64,
    /// Seconds
    pub elapsed_time: f64,
    pub searched_at: DateTime<Utc>,
    pub sites: Vec<SiteSummary>,
}

impl SearchResponse {
    pub fn new(request: SearchRequest, location: Location, result: AggregateResult) -> Self {
        Self {
            request,
            suburb: location.suburb,
            state: location.state,
            post_code: location.postcode,
            avg_price: result.average_price,
            price_count: result.price_count(),
            listing_count: result.listing_count,
            site_count: result.site_count,
            page_count: result.page_count,
            elapsed_time: result.elapsed.as_secs_f64(),
            searched_at: Utc::now(),
            sites: result.sites,
        }
    }
}

/// Resolves search text and runs the scrape for it
pub struct SearchService {
    scraper: Scraper,
    resolver: Arc<dyn LocationResolver>,
    sites: Vec<SiteConfig>,
    max_pages: u32,
}

impl SearchService {
    pub fn new(
        scraper: Scraper,
        resolver: Arc<dyn LocationResolver>,
        sites: Vec<SiteConfig>,
        max_pages: u32,
    ) -> Self {
        Self {
            scraper,
            resolver,
            sites,
            max_pages,
        }
    }

    /// Loads the postcode index and wires an HTTP scraper to the configured sites
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let index = PostcodeIndex::load(Path::new(&config.postcodes.path))?;
        Ok(Self::new(
            Scraper::from_config(config)?,
            Arc::new(index),
            config.sites.clone(),
            config.scraper.max_pages,
        ))
    }

    /// Runs one search end to end
    pub async fn search(&self, request: SearchRequest) -> SearchResponse {
        let location = self.resolver.resolve(&request.search_text);
        if location.is_empty() {
            tracing::warn!(
                "Search {} ('{}') matched no location",
                request.search_id,
                request.search_text
            );
        }

        let scrape = ScrapeRequest {
            location: location.clone(),
            sites: self.sites.clone(),
            max_pages: self.max_pages,
        };
        let result = self.scraper.scrape_listings(&scrape).await;

        SearchResponse::new(request, location, result)
    }
}
