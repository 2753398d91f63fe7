//! Integration tests for Listing-Scout

mod scrape_tests;
