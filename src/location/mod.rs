//! Location resolution for free-text searches
//!
//! A search arrives as raw text ("bondi beach", "2026", "surry hils nsw") and
//! must become a concrete suburb/state/postcode triple before any listing
//! site can be queried.
//!
//! # Components
//!
//! - `Location`: the resolved triple substituted into site URL templates
//! - `LocationResolver`: the capability the search front end calls
//! - `PostcodeIndex`: resolver backed by a postcode datafile loaded at startup

mod postcodes;

pub use postcodes::{PostcodeError, PostcodeIndex};

use serde::Serialize;

/// A resolved search location
///
/// All fields may be empty when nothing matched; the scraper substitutes
/// empty placeholders rather than treating that as fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub suburb: String,
    pub state: String,
    pub postcode: String,
}

impl Location {
    pub fn new(
        suburb: impl Into<String>,
        state: impl Into<String>,
        postcode: impl Into<String>,
    ) -> Self {
        Self {
            suburb: suburb.into(),
            state: state.into(),
            postcode: postcode.into(),
        }
    }

    /// Returns true if nothing was resolved
    pub fn is_empty(&self) -> bool {
        self.suburb.is_empty() && self.state.is_empty() && self.postcode.is_empty()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} {}", self.suburb, self.state, self.postcode)
    }
}

/// Turns raw search text into the best matching location
///
/// Implementations are queried concurrently and must not need locking.
pub trait LocationResolver: Send + Sync {
    /// Returns the best match, or an empty `Location` when nothing matched
    fn resolve(&self, search_text: &str) -> Location;
}
