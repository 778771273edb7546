use serde::{Deserialize, Serialize};

use crate::domain::{Listing, ListingCategory, ListingKind};

/// User-chosen filter criteria. Every field is optional; an absent field
/// places no restriction on the result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub kind: Option<ListingKind>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub bedrooms_min: Option<u32>,
    pub bathrooms_min: Option<u32>,
    pub location: Option<String>,
    pub query: Option<String>,
    pub category: Option<ListingCategory>,
    pub amenities: Vec<String>,
}

impl SearchFilters {
    pub fn none() -> Self {
        Self::default()
    }

    /// True when no predicate is active; filtering is then the identity.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Sets the lower price bound from raw text. An unparsable value is
    /// treated as absent rather than rejecting the whole result set on a
    /// malformed field.
    pub fn set_price_min_raw(&mut self, raw: &str) {
        self.price_min = parse_price_bound(raw);
    }

    /// Upper price bound from raw text; same lenient policy.
    pub fn set_price_max_raw(&mut self, raw: &str) {
        self.price_max = parse_price_bound(raw);
    }

    pub fn set_bedrooms_min_raw(&mut self, raw: &str) {
        self.bedrooms_min = parse_count_bound(raw);
    }

    pub fn set_bathrooms_min_raw(&mut self, raw: &str) {
        self.bathrooms_min = parse_count_bound(raw);
    }

    /// Evaluates every active predicate against one listing. Predicates
    /// are pure and conjunctive, so a single pass is equivalent to
    /// filtering once per criterion.
    pub(crate) fn matches(&self, listing: &Listing) -> bool {
        if let Some(kind) = self.kind {
            if listing.kind != kind {
                return false;
            }
        }

        if let Some(category) = self.category {
            if listing.category != category {
                return false;
            }
        }

        if let Some(min) = self.price_min {
            if listing.price < min {
                return false;
            }
        }
        if let Some(max) = self.price_max {
            if listing.price > max {
                return false;
            }
        }

        if let Some(min) = self.bedrooms_min {
            if listing.bedrooms < min {
                return false;
            }
        }
        if let Some(min) = self.bathrooms_min {
            if listing.bathrooms < min {
                return false;
            }
        }

        if let Some(needle) = active_needle(self.location.as_deref()) {
            let location = &listing.location;
            let hit = fold(&location.address).contains(&needle)
                || fold(&location.city).contains(&needle)
                || fold(&location.country).contains(&needle);
            if !hit {
                return false;
            }
        }

        if let Some(needle) = active_needle(self.query.as_deref()) {
            let hit = fold(&listing.title).contains(&needle)
                || fold(&listing.description).contains(&needle)
                || fold(&listing.location.address).contains(&needle);
            if !hit {
                return false;
            }
        }

        // Every requested amenity must be present; an empty request
        // matches everything.
        for wanted in &self.amenities {
            let Some(wanted) = active_needle(Some(wanted.as_str())) else {
                continue;
            };
            let present = listing
                .amenities
                .iter()
                .any(|amenity| fold(amenity) == wanted);
            if !present {
                return false;
            }
        }

        true
    }
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Trims and case-folds a text filter; blank input means "no filter".
fn active_needle(raw: Option<&str>) -> Option<String> {
    let folded = fold(raw?);
    if folded.is_empty() {
        None
    } else {
        Some(folded)
    }
}

fn parse_price_bound(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn parse_count_bound(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}
