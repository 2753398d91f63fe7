//! Site worker: pager discovery and page fan-out for one listing site

use crate::config::SiteConfig;
use crate::listings::context::{FetchOutcome, ScrapeContext};
use crate::listings::extract::{discover_document_page_count, SiteSelectors};
use crate::listings::page::{page_url, scrape_page};
use crate::listings::results::{PageOutcome, PageResult, SiteResult};
use crate::location::Location;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Scrapes every result page of one site
///
/// # Flow
///
/// 1. Fetch page 1 directly, since the pager is read from it
/// 2. Take the highest numbered pager link, capped at `max_pages`
/// 3. Treat a page without a pager as a single page of results
/// 4. Scrape page 1 from the fetched document and pages 2..=N concurrently
/// 5. Fold page results as they finish
///
/// A site whose first page cannot be fetched yields an empty result with a
/// `Failed` status. Later page failures only zero that page.
pub async fn scrape_site(
    ctx: &ScrapeContext,
    site: Arc<SiteConfig>,
    max_pages: u32,
    location: Arc<Location>,
) -> SiteResult {
    let selectors = match SiteSelectors::compile(&site) {
        Ok(selectors) => Arc::new(selectors),
        Err(error) => {
            tracing::error!("Skipping {}: {}", site.name, error);
            return SiteResult::failed(&site.name, error.to_string());
        }
    };

    let first_url = page_url(&site, &location, 1);
    let first_page = match ctx.fetch(&first_url).await {
        FetchOutcome::Document(document) => document,
        FetchOutcome::Failed(error) => {
            tracing::warn!("Error fetching first page of {}: {}", site.name, error);
            return SiteResult::failed(&site.name, error.to_string());
        }
        FetchOutcome::Cancelled => {
            tracing::warn!("{} cancelled before its first page arrived", site.name);
            return SiteResult::cancelled(&site.name);
        }
    };

    // The pager is read from its own parse of page 1; the page-1 worker
    // parses the body again because `Html` cannot be held across an await.
    let discovered = discover_document_page_count(&first_page, &selectors, max_pages);
    let page_count = discovered.max(1).min(max_pages);
    tracing::info!(
        "{} pages found for {} (scraping {})",
        discovered,
        site.name,
        page_count
    );

    if page_count == 0 {
        return SiteResult::from_pages(&site.name, 0, Vec::new());
    }

    let mut pages = JoinSet::new();
    let mut prefetched = Some(first_page);

    for page_number in 1..=page_count {
        let ctx = ctx.clone();
        let site = Arc::clone(&site);
        let selectors = Arc::clone(&selectors);
        let location = Arc::clone(&location);
        let document = prefetched.take();

        pages.spawn(async move {
            scrape_page(&ctx, document, &site, &selectors, &location, page_number).await
        });
    }

    let mut results = Vec::with_capacity(page_count as usize);
    while let Some(joined) = pages.join_next().await {
        match joined {
            Ok(page) => results.push(page),
            Err(error) => {
                tracing::error!("Page task for {} panicked: {}", site.name, error);
                results.push(PageResult::empty(PageOutcome::FetchFailed));
            }
        }
    }

    let result = SiteResult::from_pages(&site.name, page_count, results);
    tracing::info!(
        "{}: {} pages, {} listings, {} prices, average {}",
        result.site,
        result.page_count,
        result.listing_count,
        result.price_count(),
        result.average_price
    );
    result
}
