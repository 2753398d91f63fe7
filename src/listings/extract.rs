//! Listing and pagination extraction from result pages
//!
//! Everything here is synchronous and free of I/O. `scraper::Html` is not
//! `Send`, so documents are parsed and dropped inside these functions and
//! never held across an await point by the async workers.

use crate::config::SiteConfig;
use crate::listings::fetcher::PageDocument;
use crate::listings::price::extract_price;
use crate::listings::results::{PageOutcome, PageResult};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// A site's CSS selectors, compiled once per search
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Pager links whose text is a page number
    pub page_link: Selector,
    /// One element per listing card
    pub listing: Selector,
    /// Price element inside a listing card
    pub price: Selector,
}

impl SiteSelectors {
    /// Compiles the selectors named in a site configuration
    pub fn compile(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            page_link: compile_selector(site, "page-link", &site.page_link_selector)?,
            listing: compile_selector(site, "listing", &site.listing_selector)?,
            price: compile_selector(site, "price", &site.price_selector)?,
        })
    }
}

fn compile_selector(site: &SiteConfig, kind: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        site: site.name.clone(),
        message: format!("{} selector '{}': {:?}", kind, css, e),
    })
}

/// Counts listings on a page and collects their valid prices
///
/// Listings are visited in document order. The text of every price element
/// in a listing is read together, so a leading "Contact agent" badge does
/// not hide a later figure. A listing without a price element is still
/// counted, it just contributes no price.
pub fn extract_page(document: &Html, selectors: &SiteSelectors) -> PageResult {
    let mut result = PageResult::empty(PageOutcome::Scraped);

    for listing in document.select(&selectors.listing) {
        result.listing_count += 1;

        let price_text = listing
            .select(&selectors.price)
            .map(element_text)
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(price) = extract_price(&price_text) {
            result.prices.push(price);
        }
    }

    result
}

/// Finds the highest page number in the pager, capped at `max_pages`
///
/// Pager entries that are not numbers ("Next", "…") are ignored. Returns 0
/// when the page has no numbered pager links.
pub fn discover_page_count(document: &Html, selectors: &SiteSelectors, max_pages: u32) -> u32 {
    document
        .select(&selectors.page_link)
        .filter_map(|link| element_text(link).trim().parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        .min(max_pages)
}

/// Parses a fetched page and extracts its listings
pub fn extract_document(document: &PageDocument, selectors: &SiteSelectors) -> PageResult {
    extract_page(&document.parse(), selectors)
}

/// Parses a fetched page and reads its pager
pub fn discover_document_page_count(
    document: &PageDocument,
    selectors: &SiteSelectors,
    max_pages: u32,
) -> u32 {
    discover_page_count(&document.parse(), selectors, max_pages)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}
