//! Scrape orchestrator - the single entry point for a search
//!
//! Fans out one site worker per enabled site, waits for every one of them,
//! and folds their results into the aggregate handed back to the caller.

use crate::config::{Config, ScraperConfig, SiteConfig};
use crate::listings::context::ScrapeContext;
use crate::listings::fetcher::{Fetch, HttpFetcher};
use crate::listings::results::{AggregateResult, SiteResult};
use crate::listings::site::scrape_site;
use crate::location::Location;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// One resolved search
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub location: Location,
    pub sites: Vec<SiteConfig>,
    /// Cap on result pages walked per site
    pub max_pages: u32,
}

/// Limits applied to every search a `Scraper` runs
#[derive(Debug, Clone)]
pub struct ScraperOptions {
    /// Fetches in flight across all sites and pages of one search
    pub max_concurrent_fetches: usize,
    /// Deadline after which outstanding fetches are abandoned
    pub search_timeout: Option<Duration>,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            search_timeout: None,
        }
    }
}

impl From<&ScraperConfig> for ScraperOptions {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            max_concurrent_fetches: config.max_concurrent_fetches as usize,
            search_timeout: Some(config.search_timeout()),
        }
    }
}

/// Runs searches against the configured listing sites
pub struct Scraper {
    fetcher: Arc<dyn Fetch>,
    options: ScraperOptions,
}

impl Scraper {
    pub fn new(fetcher: Arc<dyn Fetch>, options: ScraperOptions) -> Self {
        Self { fetcher, options }
    }

    /// Builds a scraper that fetches over HTTP with the configured identity
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let fetcher =
            HttpFetcher::from_config(&config.user_agent, config.scraper.request_timeout())?;
        Ok(Self::new(Arc::new(fetcher), ScraperOptions::from(&config.scraper)))
    }

    /// Scrapes every enabled site and folds the results
    ///
    /// Never fails: unreachable sites and pages simply contribute nothing.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use listing_scout::config::load_config;
    /// use listing_scout::listings::{ScrapeRequest, Scraper};
    /// use listing_scout::location::Location;
    /// use std::path::Path;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = load_config(Path::new("config.toml"))?;
    /// let scraper = Scraper::from_config(&config)?;
    /// let request = ScrapeRequest {
    ///     location: Location::new("bondi", "nsw", "2026"),
    ///     sites: config.sites.clone(),
    ///     max_pages: config.scraper.max_pages,
    /// };
    /// let result = scraper.scrape_listings(&request).await;
    /// println!("Average price: {}", result.average_price);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scrape_listings(&self, request: &ScrapeRequest) -> AggregateResult {
        self.scrape_listings_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Like `scrape_listings`, but stops early when `cancel` is triggered
    ///
    /// Work already finished when the token fires is still folded into the
    /// result.
    pub async fn scrape_listings_with_cancellation(
        &self,
        request: &ScrapeRequest,
        cancel: CancellationToken,
    ) -> AggregateResult {
        let started = Instant::now();
        tracing::info!("Search received for {}", request.location);

        let cancel = cancel.child_token();
        let deadline = self
            .options
            .search_timeout
            .map(|timeout| spawn_deadline(timeout, cancel.clone()));

        let ctx = ScrapeContext::new(
            Arc::clone(&self.fetcher),
            self.options.max_concurrent_fetches,
            cancel,
        );
        let location = Arc::new(request.location.clone());

        let mut sites = JoinSet::new();
        let mut scheduled = Vec::new();
        for site in request.sites.iter().filter(|site| site.enabled) {
            scheduled.push(site.name.clone());
            let ctx = ctx.clone();
            let site = Arc::new(site.clone());
            let location = Arc::clone(&location);
            let max_pages = request.max_pages;

            sites.spawn(async move { scrape_site(&ctx, site, max_pages, location).await });
        }

        let mut results = Vec::with_capacity(scheduled.len());
        let mut panicked = 0;
        while let Some(joined) = sites.join_next().await {
            match joined {
                Ok(site) => results.push(site),
                Err(error) => {
                    tracing::error!("Site task panicked: {}", error);
                    panicked += 1;
                }
            }
        }
        if panicked > 0 {
            record_panicked_sites(&mut results, &scheduled);
        }

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let aggregate = AggregateResult::from_sites(results, started);
        tracing::info!(
            "Search for {} finished in {:.2}s: {} sites, {} pages, {} listings, {} prices, average {}",
            request.location,
            aggregate.elapsed.as_secs_f64(),
            aggregate.site_count,
            aggregate.page_count,
            aggregate.listing_count,
            aggregate.price_count(),
            aggregate.average_price
        );
        aggregate
    }
}

/// Adds a failed result for every scheduled site that never reported back
fn record_panicked_sites(results: &mut Vec<SiteResult>, scheduled: &[String]) {
    for name in scheduled {
        if !results.iter().any(|result| &result.site == name) {
            results.push(SiteResult::failed(name, "site worker panicked"));
        }
    }
}

/// Cancels `token` once `timeout` has elapsed
fn spawn_deadline(timeout: Duration, token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!("Search deadline of {:?} reached, abandoning outstanding fetches", timeout);
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}

impl std::fmt::Debug for Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper")
            .field("options", &self.options)
            .finish()
    }
}
