//! Page worker: one result page per invocation

use crate::config::SiteConfig;
use crate::listings::context::{FetchOutcome, ScrapeContext};
use crate::listings::extract::{extract_document, SiteSelectors};
use crate::listings::fetcher::PageDocument;
use crate::listings::results::{PageOutcome, PageResult};
use crate::location::Location;

/// Builds the URL of one result page from the site's template
///
/// Spaces in the suburb become hyphens. Empty location fields substitute as
/// empty strings.
pub fn page_url(site: &SiteConfig, location: &Location, page_number: u32) -> String {
    site.search_url
        .replace("{{suburb}}", &location.suburb.replace(' ', "-"))
        .replace("{{state}}", &location.state)
        .replace("{{postCode}}", &location.postcode)
        .replace("{{pageNo}}", &page_number.to_string())
}

/// Scrapes a single result page
///
/// `prefetched` is the first page, already downloaded while reading the
/// pager; every other page is fetched here. A failed fetch yields an empty
/// result instead of an error so sibling pages are unaffected.
pub async fn scrape_page(
    ctx: &ScrapeContext,
    prefetched: Option<PageDocument>,
    site: &SiteConfig,
    selectors: &SiteSelectors,
    location: &Location,
    page_number: u32,
) -> PageResult {
    let document = match prefetched {
        Some(document) => document,
        None => {
            let url = page_url(site, location, page_number);
            match ctx.fetch(&url).await {
                FetchOutcome::Document(document) => document,
                FetchOutcome::Failed(error) => {
                    tracing::warn!("Page {} of {} failed: {}", page_number, site.name, error);
                    return PageResult::empty(PageOutcome::FetchFailed);
                }
                FetchOutcome::Cancelled => {
                    tracing::debug!("Page {} of {} cancelled", page_number, site.name);
                    return PageResult::empty(PageOutcome::Cancelled);
                }
            }
        }
    };

    let result = extract_document(&document, selectors);
    tracing::debug!(
        "Page {} of {}: {} listings, {} prices",
        page_number,
        site.name,
        result.listing_count,
        result.price_count()
    );
    result
}
