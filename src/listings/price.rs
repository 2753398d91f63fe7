//! Price parsing for free-form listing text
//!
//! Listing cards say things like "$1,250,000", "Offers over $850,000",
//! "Auction" or "3 bed, 2 bath". Only the first currency-like number is
//! considered, and anything outside a plausible price range is discarded so
//! bedroom counts and land areas never leak into the averages.

use lazy_static::lazy_static;
use regex::Regex;

/// Smallest value accepted as a price
pub const MIN_PRICE: u64 = 10_000;

/// Largest value accepted as a price
pub const MAX_PRICE: u64 = 999_999_999;

lazy_static! {
    // Up to three groups of 1-3 digits, optionally comma separated, with an
    // optional leading currency symbol. ASCII digits only.
    static ref PRICE_REGEX: Regex = Regex::new(
        r"\$*[0-9]{1,3},*[0-9]{1,3},*[0-9]{1,3}"
    ).unwrap();
}

/// Extracts a plausible price from listing text
///
/// Returns `None` when no number matches or the value falls outside
/// [`MIN_PRICE`]..=[`MAX_PRICE`]. A listing without a price is normal.
///
/// # Example
///
/// ```
/// use listing_scout::listings::extract_price;
///
/// assert_eq!(extract_price("$1,250,000"), Some(1_250_000));
/// assert_eq!(extract_price("Contact agent"), None);
/// ```
pub fn extract_price(text: &str) -> Option<u64> {
    let matched = PRICE_REGEX.find(text)?;

    let digits: String = matched
        .as_str()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let price = digits.parse::<u64>().ok()?;

    (MIN_PRICE..=MAX_PRICE).contains(&price).then_some(price)
}

/// Integer mean of a set of prices, zero when there are none
///
/// Sums in a `u128` so large scrapes cannot overflow.
pub fn average_price(prices: &[u64]) -> u64 {
    if prices.is_empty() {
        return 0;
    }

    let total: u128 = prices.iter().map(|&price| u128::from(price)).sum();
    (total / prices.len() as u128) as u64
}
