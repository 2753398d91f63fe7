//! End-to-end scrape tests
//!
//! These tests use wiremock to stand in for listing sites and drive the
//! full orchestrator → site → page pipeline over real HTTP.

use crate::support::{http_scraper, location, page_path, results_page, site};
use async_trait::async_trait;
use listing_scout::listings::{
    Fetch, PageDocument, ScrapeRequest, Scraper, ScraperOptions, SiteStatus,
};
use listing_scout::location::Location;
use listing_scout::FetchError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, prefix: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path(prefix, page)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_sites_one_unreachable() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    // Site A: two pages, one price each
    mount_page(&server, "a", 1, results_page(&["$500,000"], 2)).await;
    mount_page(&server, "a", 2, results_page(&["$600,000"], 2)).await;

    // Site B: everything fails
    Mock::given(method("GET"))
        .and(path_regex("^/b/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let request = ScrapeRequest {
        location: location(),
        sites: vec![site("a", &base_url, "a"), site("b", &base_url, "b")],
        max_pages: 5,
    };

    let result = http_scraper(None).scrape_listings(&request).await;

    assert_eq!(result.site_count, 2);
    assert_eq!(result.page_count, 2);
    assert_eq!(result.listing_count, 2);
    assert_eq!(result.price_count(), 2);
    assert_eq!(result.average_price, 550_000);

    let a = result.sites.iter().find(|s| s.site == "a").unwrap();
    let b = result.sites.iter().find(|s| s.site == "b").unwrap();
    assert_eq!(a.status, SiteStatus::Ok);
    assert_eq!(a.average_price, 550_000);
    assert!(matches!(b.status, SiteStatus::Failed { .. }));
    assert_eq!(b.page_count, 0);
    assert_eq!(b.listing_count, 0);
}

#[tokio::test]
async fn test_page_count_capped_at_max_pages() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    for page in 1..=3 {
        mount_page(&server, "a", page, results_page(&["$700,000", "POA"], 10)).await;
    }

    // Nothing past the cap may be requested
    for page in 4..=10 {
        Mock::given(method("GET"))
            .and(path(page_path("a", page)))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[], 10)))
            .expect(0)
            .mount(&server)
            .await;
    }

    let request = ScrapeRequest {
        location: location(),
        sites: vec![site("a", &base_url, "a")],
        max_pages: 3,
    };

    let result = http_scraper(None).scrape_listings(&request).await;

    assert_eq!(result.site_count, 1);
    assert_eq!(result.page_count, 3);
    assert_eq!(result.listing_count, 6);
    assert_eq!(result.price_count(), 3);
    assert_eq!(result.average_price, 700_000);
}

#[tokio::test]
async fn test_disabled_sites_never_run() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "a", 1, results_page(&["$450,000"], 1)).await;

    Mock::given(method("GET"))
        .and(path_regex("^/b/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&["$9,000,000"], 1)))
        .expect(0)
        .mount(&server)
        .await;

    let mut disabled = site("b", &base_url, "b");
    disabled.enabled = false;

    let request = ScrapeRequest {
        location: location(),
        sites: vec![site("a", &base_url, "a"), disabled],
        max_pages: 5,
    };

    let result = http_scraper(None).scrape_listings(&request).await;

    assert_eq!(result.site_count, 1);
    assert_eq!(result.sites.len(), 1);
    assert_eq!(result.sites[0].site, "a");
    assert_eq!(result.average_price, 450_000);
}

#[tokio::test]
async fn test_failed_page_only_zeroes_that_page() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "a", 1, results_page(&["$400,000", "$500,000"], 3)).await;
    Mock::given(method("GET"))
        .and(path(page_path("a", 2)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "a", 3, results_page(&["$600,000"], 3)).await;

    let request = ScrapeRequest {
        location: location(),
        sites: vec![site("a", &base_url, "a")],
        max_pages: 5,
    };

    let result = http_scraper(None).scrape_listings(&request).await;

    assert_eq!(result.page_count, 3);
    assert_eq!(result.listing_count, 3);
    assert_eq!(result.price_count(), 3);
    assert_eq!(result.average_price, 500_000);
    assert_eq!(
        result.sites[0].status,
        SiteStatus::Degraded { failed_pages: 1 }
    );
}

#[tokio::test]
async fn test_single_page_without_pager_is_scraped() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "a",
        1,
        results_page(&["$1,100,000", "Contact agent", "$900,000"], 0),
    )
    .await;

    let request = ScrapeRequest {
        location: location(),
        sites: vec![site("a", &base_url, "a")],
        max_pages: 5,
    };

    let result = http_scraper(None).scrape_listings(&request).await;

    assert_eq!(result.page_count, 1);
    assert_eq!(result.listing_count, 3);
    assert_eq!(result.price_count(), 2);
    assert_eq!(result.average_price, 1_000_000);
}

#[tokio::test]
async fn test_empty_location_is_tolerated() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/a/--/page-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&["$300,000"], 1)))
        .expect(1)
        .mount(&server)
        .await;

    let request = ScrapeRequest {
        location: Location::default(),
        sites: vec![site("a", &base_url, "a")],
        max_pages: 5,
    };

    let result = http_scraper(None).scrape_listings(&request).await;

    assert_eq!(result.site_count, 1);
    assert_eq!(result.average_price, 300_000);
}

#[tokio::test]
async fn test_deadline_keeps_completed_work() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    // Site A: page 1 is quick, page 2 hangs past the deadline
    mount_page(&server, "a", 1, results_page(&["$800,000"], 2)).await;
    Mock::given(method("GET"))
        .and(path(page_path("a", 2)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(results_page(&["$100,000"], 2))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    // Site B: a single quick page
    mount_page(&server, "b", 1, results_page(&["$400,000"], 1)).await;

    let request = ScrapeRequest {
        location: location(),
        sites: vec![site("a", &base_url, "a"), site("b", &base_url, "b")],
        max_pages: 5,
    };

    let scraper = http_scraper(Some(Duration::from_millis(500)));
    let result = scraper.scrape_listings(&request).await;

    assert!(
        result.elapsed < Duration::from_secs(5),
        "search took {:?}",
        result.elapsed
    );
    assert_eq!(result.site_count, 2);
    assert_eq!(result.page_count, 3);
    assert_eq!(result.price_count(), 2);
    assert_eq!(result.average_price, 600_000);

    let a = result.sites.iter().find(|s| s.site == "a").unwrap();
    let b = result.sites.iter().find(|s| s.site == "b").unwrap();
    assert_eq!(a.status, SiteStatus::Cancelled);
    assert_eq!(a.price_count, 1);
    assert_eq!(b.status, SiteStatus::Ok);
}

#[tokio::test]
async fn test_cancelled_search_returns_empty_result() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&["$500,000"], 1)))
        .expect(0)
        .mount(&server)
        .await;

    let request = ScrapeRequest {
        location: location(),
        sites: vec![site("a", &base_url, "a"), site("b", &base_url, "b")],
        max_pages: 5,
    };

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = http_scraper(None)
        .scrape_listings_with_cancellation(&request, cancel)
        .await;

    assert_eq!(result.site_count, 2);
    assert_eq!(result.price_count(), 0);
    assert_eq!(result.average_price, 0);
    assert!(result
        .sites
        .iter()
        .all(|s| s.status == SiteStatus::Cancelled));
}

/// Serves generated result pages and records how many fetches overlap
struct CountingFetcher {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl CountingFetcher {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetch for CountingFetcher {
    async fn fetch(&self, url: &str) -> Result<PageDocument, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(PageDocument::new(url, results_page(&["$500,000"], 5)))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fetches_share_a_global_bound() {
    let fetcher = Arc::new(CountingFetcher::new());
    let scraper = Scraper::new(
        fetcher.clone(),
        ScraperOptions {
            max_concurrent_fetches: 2,
            search_timeout: None,
        },
    );

    let base_url = "https://listings.example.com";
    let request = ScrapeRequest {
        location: location(),
        sites: vec![
            site("a", base_url, "a"),
            site("b", base_url, "b"),
            site("c", base_url, "c"),
        ],
        max_pages: 5,
    };

    let result = scraper.scrape_listings(&request).await;

    assert_eq!(result.site_count, 3);
    assert_eq!(result.page_count, 15);
    assert_eq!(result.price_count(), 15);
    // Page 1 of each site is fetched once and reused
    assert_eq!(fetcher.total.load(Ordering::SeqCst), 15);
    assert!(fetcher.peak.load(Ordering::SeqCst) <= 2);
}

/// Panics for every URL under `/b/`, serves a one-page result otherwise
struct PanickingFetcher;

#[async_trait]
impl Fetch for PanickingFetcher {
    async fn fetch(&self, url: &str) -> Result<PageDocument, FetchError> {
        if url.contains("/b/") {
            panic!("parser blew up on {}", url);
        }
        Ok(PageDocument::new(url, results_page(&["$650,000"], 1)))
    }
}

#[tokio::test]
async fn test_panicking_site_is_reported_as_failed() {
    let scraper = Scraper::new(Arc::new(PanickingFetcher), ScraperOptions::default());

    let base_url = "https://listings.example.com";
    let request = ScrapeRequest {
        location: location(),
        sites: vec![site("a", base_url, "a"), site("b", base_url, "b")],
        max_pages: 5,
    };

    let result = scraper.scrape_listings(&request).await;

    assert_eq!(result.site_count, 2);
    assert_eq!(result.average_price, 650_000);

    let a = result.sites.iter().find(|s| s.site == "a").unwrap();
    let b = result.sites.iter().find(|s| s.site == "b").unwrap();
    assert_eq!(a.status, SiteStatus::Ok);
    assert!(matches!(b.status, SiteStatus::Failed { .. }));
    assert_eq!(b.listing_count, 0);
}
