//! Best-effort geocoding contract.
//!
//! Both directions return `None` when the backend has no match; only
//! transport problems surface as errors.

use async_trait::async_trait;

use crate::domain::GeoPoint;

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("geocoding backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Address text to coordinates.
    async fn forward(&self, address: &str) -> Result<Option<GeoPoint>, GeoError>;
    /// Coordinates to a formatted address.
    async fn reverse(&self, point: GeoPoint) -> Result<Option<String>, GeoError>;
}

struct GeoEntry {
    needle: &'static str,
    formatted: &'static str,
    point: GeoPoint,
}

/// Offline geocoder over a small fixed city table; backs demos and
/// tests deterministically.
pub struct StaticGeocoder {
    entries: Vec<GeoEntry>,
}

impl StaticGeocoder {
    pub fn with_defaults() -> Self {
        Self {
            entries: vec![
                GeoEntry {
                    needle: "paris",
                    formatted: "Paris, France",
                    point: GeoPoint {
                        latitude: 48.8566,
                        longitude: 2.3522,
                    },
                },
                GeoEntry {
                    needle: "lyon",
                    formatted: "Lyon, France",
                    point: GeoPoint {
                        latitude: 45.7640,
                        longitude: 4.8357,
                    },
                },
                GeoEntry {
                    needle: "marseille",
                    formatted: "Marseille, France",
                    point: GeoPoint {
                        latitude: 43.2965,
                        longitude: 5.3698,
                    },
                },
                GeoEntry {
                    needle: "bordeaux",
                    formatted: "Bordeaux, France",
                    point: GeoPoint {
                        latitude: 44.8378,
                        longitude: -0.5792,
                    },
                },
            ],
        }
    }
}

// Matches within roughly half a degree; beyond that the lookup reports
// no result rather than a far-off city.
const REVERSE_TOLERANCE: f64 = 0.5;

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn forward(&self, address: &str) -> Result<Option<GeoPoint>, GeoError> {
        let needle = address.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        let hit = self
            .entries
            .iter()
            .find(|entry| needle.contains(entry.needle))
            .map(|entry| entry.point);
        Ok(hit)
    }

    async fn reverse(&self, point: GeoPoint) -> Result<Option<String>, GeoError> {
        let hit = self
            .entries
            .iter()
            .filter(|entry| {
                (entry.point.latitude - point.latitude).abs() <= REVERSE_TOLERANCE
                    && (entry.point.longitude - point.longitude).abs() <= REVERSE_TOLERANCE
            })
            .min_by(|a, b| {
                distance_squared(a.point, point)
                    .partial_cmp(&distance_squared(b.point, point))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|entry| entry.formatted.to_string());
        Ok(hit)
    }
}

fn distance_squared(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat = a.latitude - b.latitude;
    let lon = a.longitude - b.longitude;
    lat * lat + lon * lon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forward_matches_a_known_city_in_a_full_address() {
        let geocoder = StaticGeocoder::with_defaults();
        let point = geocoder
            .forward("12 Rue des Lilas, Lyon, France")
            .await
            .expect("lookup runs")
            .expect("lyon resolves");
        assert!((point.latitude - 45.7640).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn forward_returns_none_for_unknown_places() {
        let geocoder = StaticGeocoder::with_defaults();
        let result = geocoder.forward("Atlantis").await.expect("lookup runs");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn reverse_resolves_nearby_coordinates() {
        let geocoder = StaticGeocoder::with_defaults();
        let formatted = geocoder
            .reverse(GeoPoint {
                latitude: 48.86,
                longitude: 2.35,
            })
            .await
            .expect("lookup runs");
        assert_eq!(formatted.as_deref(), Some("Paris, France"));
    }

    #[tokio::test]
    async fn reverse_returns_none_when_nothing_is_close() {
        let geocoder = StaticGeocoder::with_defaults();
        let formatted = geocoder
            .reverse(GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            })
            .await
            .expect("lookup runs");
        assert!(formatted.is_none());
    }
}
