//! Result types produced at each level of the scrape
//!
//! Pages fold into sites and sites fold into the aggregate. Both folds only
//! sum counts and concatenate prices, so the order results arrive in never
//! changes the totals. Price counts are always derived from the price lists
//! to keep the two from drifting apart.

use crate::listings::price::average_price;
use serde::Serialize;
use std::time::{Duration, Instant};

/// How a single page ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOutcome {
    Scraped,
    FetchFailed,
    Cancelled,
}

/// Listings and prices found on exactly one result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub outcome: PageOutcome,
    pub listing_count: usize,
    /// Prices in document order of their listings
    pub prices: Vec<u64>,
}

impl PageResult {
    /// A page that contributed nothing
    pub fn empty(outcome: PageOutcome) -> Self {
        Self {
            outcome,
            listing_count: 0,
            prices: Vec::new(),
        }
    }

    pub fn price_count(&self) -> usize {
        self.prices.len()
    }
}

/// Health of one site's contribution to a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SiteStatus {
    /// Every scheduled page was scraped
    Ok,
    /// Some result pages could not be fetched
    #[serde(rename_all = "camelCase")]
    Degraded { failed_pages: u32 },
    /// The first result page could not be fetched
    Failed { cause: String },
    /// The search deadline cut the site short
    Cancelled,
}

/// Everything scraped from one listing site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteResult {
    pub site: String,
    pub status: SiteStatus,
    pub page_count: u32,
    pub listing_count: usize,
    pub prices: Vec<u64>,
    pub average_price: u64,
}

impl SiteResult {
    /// A site whose first page never arrived
    pub fn failed(site: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::empty(site, SiteStatus::Failed {
            cause: cause.into(),
        })
    }

    /// A site cancelled before its first page arrived
    pub fn cancelled(site: impl Into<String>) -> Self {
        Self::empty(site, SiteStatus::Cancelled)
    }

    fn empty(site: impl Into<String>, status: SiteStatus) -> Self {
        Self {
            site: site.into(),
            status,
            page_count: 0,
            listing_count: 0,
            prices: Vec::new(),
            average_price: 0,
        }
    }

    /// Folds page results, in whatever order they finished, into a site result
    pub fn from_pages(
        site: impl Into<String>,
        page_count: u32,
        pages: impl IntoIterator<Item = PageResult>,
    ) -> Self {
        let mut listing_count = 0;
        let mut prices = Vec::new();
        let mut failed_pages = 0;
        let mut cancelled_pages = 0;

        for page in pages {
            match page.outcome {
                PageOutcome::Scraped => {}
                PageOutcome::FetchFailed => failed_pages += 1,
                PageOutcome::Cancelled => cancelled_pages += 1,
            }
            listing_count += page.listing_count;
            prices.extend(page.prices);
        }

        let status = if cancelled_pages > 0 {
            SiteStatus::Cancelled
        } else if failed_pages > 0 {
            SiteStatus::Degraded { failed_pages }
        } else {
            SiteStatus::Ok
        };

        let average_price = average_price(&prices);
        Self {
            site: site.into(),
            status,
            page_count,
            listing_count,
            prices,
            average_price,
        }
    }

    pub fn price_count(&self) -> usize {
        self.prices.len()
    }

    /// The per-site line reported alongside the aggregate
    pub fn summary(&self) -> SiteSummary {
        SiteSummary {
            site: self.site.clone(),
            status: self.status.clone(),
            page_count: self.page_count,
            listing_count: self.listing_count,
            price_count: self.price_count(),
            average_price: self.average_price,
        }
    }
}

/// Per-site counts without the price list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub site: String,
    #[serde(flatten)]
    pub status: SiteStatus,
    pub page_count: u32,
    pub listing_count: usize,
    pub price_count: usize,
    pub average_price: u64,
}

/// The single summary handed back for a search
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    /// Sites that actually ran, including ones that failed
    pub site_count: usize,
    pub page_count: u64,
    pub listing_count: usize,
    pub prices: Vec<u64>,
    pub average_price: u64,
    pub elapsed: Duration,
    pub sites: Vec<SiteSummary>,
}

impl AggregateResult {
    /// Folds site results into the aggregate, timing from `started`
    pub fn from_sites(sites: impl IntoIterator<Item = SiteResult>, started: Instant) -> Self {
        let mut site_count = 0;
        let mut page_count = 0;
        let mut listing_count = 0;
        let mut prices = Vec::new();
        let mut summaries = Vec::new();

        for site in sites {
            site_count += 1;
            page_count += u64::from(site.page_count);
            listing_count += site.listing_count;
            summaries.push(site.summary());
            prices.extend(site.prices);
        }

        let elapsed = started.elapsed();
        let average_price = average_price(&prices);

        Self {
            site_count,
            page_count,
            listing_count,
            prices,
            average_price,
            elapsed,
            sites: summaries,
        }
    }

    pub fn price_count(&self) -> usize {
        self.prices.len()
    }
}
