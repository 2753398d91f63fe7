//! Postcode index backed by a GeoNames-style postal code dump
//!
//! Each non-empty line is tab separated:
//! `country  postcode  suburb  state-name  state-code  ...`
//!
//! The index is built once at startup and is read-only afterwards, so it can
//! sit behind an `Arc` and serve concurrent searches without locking.

use crate::location::{Location, LocationResolver};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

/// Errors raised while building the postcode index
#[derive(Debug, Error)]
pub enum PostcodeError {
    #[error("Failed to read postcode file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Postcode file contained no usable rows")]
    Empty,
}

#[derive(Debug, Clone)]
struct PostcodeEntry {
    suburb: String,
    state: String,
    postcode: String,
    /// Lowercase words of "suburb state postcode"
    tokens: Vec<String>,
    /// Shorter suburbs first, then lower postcodes
    weight: u64,
}

/// Immutable suburb/state/postcode lookup table
#[derive(Debug, Clone)]
pub struct PostcodeIndex {
    entries: Vec<PostcodeEntry>,
}

impl PostcodeIndex {
    /// Loads the index from a postcode file
    pub fn load(path: &Path) -> Result<Self, PostcodeError> {
        let started = Instant::now();
        let content = std::fs::read_to_string(path).map_err(|source| PostcodeError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let index = Self::from_tsv(&content)?;
        tracing::info!(
            "Loaded {} postcodes in {:.3} seconds",
            index.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(index)
    }

    /// Builds the index from tab-separated text
    pub fn from_tsv(content: &str) -> Result<Self, PostcodeError> {
        let mut entries = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 5 {
                tracing::debug!("Skipping postcode row {}: too few columns", line_no + 1);
                continue;
            }

            let postcode = columns[1].trim().to_lowercase();
            let suburb = columns[2].trim().to_lowercase();
            let state = columns[4].trim().to_lowercase();

            let numeric_postcode = postcode.parse::<u64>().unwrap_or(0);
            let weight = (suburb.len() as u64) * 1000 + numeric_postcode;
            let tokens = normalize(&format!("{} {} {}", suburb, state, postcode));

            entries.push(PostcodeEntry {
                suburb,
                state,
                postcode,
                tokens,
                weight,
            });
        }

        if entries.is_empty() {
            return Err(PostcodeError::Empty);
        }

        Ok(Self { entries })
    }

    /// Number of rows in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the best entry for the query words
    ///
    /// Every query word must match some word of the entry, either as a
    /// prefix or as a fuzzy match missing a few letters. Fewer missing
    /// letters win, then the lower weight.
    fn best_match(&self, query: &[String]) -> Option<&PostcodeEntry> {
        let matcher = SkimMatcherV2::default();
        self.entries
            .iter()
            .filter_map(|entry| {
                entry_cost(&matcher, query, &entry.tokens).map(|cost| (cost, entry))
            })
            .min_by_key(|(cost, entry)| (*cost, entry.weight))
            .map(|(_, entry)| entry)
    }
}

impl LocationResolver for PostcodeIndex {
    fn resolve(&self, search_text: &str) -> Location {
        let query = normalize(search_text);
        if query.is_empty() {
            return Location::default();
        }

        match self.best_match(&query) {
            Some(entry) => Location::new(&entry.suburb, &entry.state, &entry.postcode),
            None => {
                tracing::debug!("No postcode match for '{}'", search_text);
                Location::default()
            }
        }
    }
}

/// Lowercases and splits text into alphanumeric words
fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Total letters missing to match every query word, or None if any word misses
fn entry_cost(matcher: &SkimMatcherV2, query: &[String], tokens: &[String]) -> Option<usize> {
    query.iter().try_fold(0, |total, word| {
        tokens
            .iter()
            .filter_map(|token| word_cost(matcher, word, token))
            .min()
            .map(|cost| total + cost)
    })
}

/// Scores one query word against one entry word
///
/// A prefix costs nothing. Otherwise the query word must fuzzy match the
/// entry word, and the letters it skips are the cost: none allowed for words
/// of up to 3 letters, 1 for up to 7, 2 beyond that.
fn word_cost(matcher: &SkimMatcherV2, word: &str, token: &str) -> Option<usize> {
    if token.starts_with(word) {
        return Some(0);
    }

    let word_len = word.chars().count();
    let allowed = match word_len {
        0..=3 => 0,
        4..=7 => 1,
        _ => 2,
    };
    if allowed == 0 {
        return None;
    }

    matcher.fuzzy_match(token, word)?;
    let skipped = token.chars().count().checked_sub(word_len)?;
    (skipped <= allowed).then_some(skipped)
}
