//! Client-side filter-and-sort pipeline over an in-memory listing set.
//!
//! The engine is a pure leaf utility: it never mutates its input, performs
//! no I/O, and running it twice with identical inputs yields identical
//! output. Callers that have no listings to offer pass an empty slice and
//! get an empty result; display pipelines must never crash on missing
//! data.

mod filters;

pub use filters::SearchFilters;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::Listing;

/// Sort order applied after filtering. `Relevance` preserves the input
/// order; the other keys are stable, so tied listings keep their relative
/// input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    DateDesc,
}

impl SortKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relevance => "Relevance",
            Self::PriceAsc => "Price (low to high)",
            Self::PriceDesc => "Price (high to low)",
            Self::DateDesc => "Most recent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "relevance" => Some(Self::Relevance),
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "date_desc" | "date" => Some(Self::DateDesc),
            _ => None,
        }
    }
}

/// Applies every active filter predicate conjunctively, then exactly one
/// stable sort pass for the chosen key. Returns a new sequence; the input
/// is left untouched.
pub fn search(listings: &[Listing], filters: &SearchFilters, sort: SortKey) -> Vec<Listing> {
    let mut matched: Vec<Listing> = listings
        .iter()
        .filter(|listing| filters.matches(listing))
        .cloned()
        .collect();

    match sort {
        SortKey::Relevance => {}
        SortKey::PriceAsc => matched.sort_by(|a, b| compare_prices(a.price, b.price)),
        SortKey::PriceDesc => matched.sort_by(|a, b| compare_prices(b.price, a.price)),
        SortKey::DateDesc => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    matched
}

// Prices are validated finite and non-negative at publish time; any
// residual NaN compares as equal so the stable sort leaves it in place.
fn compare_prices(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
