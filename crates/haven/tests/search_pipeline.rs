//! Integration specifications for the client-side filter-and-sort
//! pipeline.
//!
//! Scenarios exercise the public `search` entry point the way the browse
//! screens consume it: a loaded listing set, a filter specification, and
//! one sort key.

use chrono::{Duration, TimeZone, Utc};
use haven::domain::{
    GeoPoint, Listing, ListingCategory, ListingId, ListingKind, ListingLocation, ListingStatus,
    OwnerSummary, RentPeriod, UserId,
};
use haven::search::{search, SearchFilters, SortKey};

fn listing(id: &str, city: &str, kind: ListingKind, price: f64, bedrooms: u32) -> Listing {
    let created_at = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
    Listing {
        id: ListingId(id.to_string()),
        title: format!("{city} {}", ListingCategory::Apartment.label()),
        description: "Sunlit rooms and quiet street".to_string(),
        price,
        kind,
        category: ListingCategory::Apartment,
        bedrooms,
        bathrooms: 1,
        area: 48.0,
        location: ListingLocation {
            address: format!("3 Rue Neuve, {city}"),
            city: city.to_string(),
            country: "France".to_string(),
            point: GeoPoint {
                latitude: 45.0,
                longitude: 4.0,
            },
        },
        images: vec!["https://images.example/a.jpg".to_string()],
        amenities: vec!["Parking".to_string()],
        owner: OwnerSummary {
            id: UserId("owner-1".to_string()),
            display_name: "Nadia".to_string(),
            photo_url: None,
        },
        created_at,
        updated_at: created_at,
        featured: false,
        rent_period: Some(RentPeriod::Month),
        status: ListingStatus::Available,
    }
}

fn corpus() -> Vec<Listing> {
    let mut listings = vec![
        listing("a", "Lyon", ListingKind::ForRent, 980.0, 2),
        listing("b", "Paris", ListingKind::ForRent, 1450.0, 1),
        listing("c", "Lyon", ListingKind::ForSale, 310_000.0, 3),
        listing("d", "Bordeaux", ListingKind::ForRent, 640.0, 0),
        listing("e", "Lyon", ListingKind::ForRent, 980.0, 1),
    ];
    // Spread creation dates so date sorting is observable.
    for (index, entry) in listings.iter_mut().enumerate() {
        entry.created_at = entry.created_at + Duration::days(index as i64);
        entry.updated_at = entry.created_at;
    }
    listings
}

fn ids(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(|entry| entry.id.0.as_str()).collect()
}

fn position(full: &[Listing], id: &ListingId) -> usize {
    full.iter()
        .position(|entry| entry.id == *id)
        .expect("result element comes from the input")
}

#[test]
fn results_are_a_subsequence_satisfying_every_predicate() {
    let input = corpus();
    let mut filters = SearchFilters::none();
    filters.kind = Some(ListingKind::ForRent);
    filters.price_min = Some(700.0);
    filters.location = Some("lyon".to_string());

    let output = search(&input, &filters, SortKey::Relevance);

    // No invented elements, input order preserved under relevance.
    let mut last_position = None;
    for entry in &output {
        let index = position(&input, &entry.id);
        if let Some(previous) = last_position {
            assert!(index > previous, "relevance must preserve input order");
        }
        last_position = Some(index);

        assert_eq!(entry.kind, ListingKind::ForRent);
        assert!(entry.price >= 700.0);
        assert_eq!(entry.location.city, "Lyon");
    }
    assert_eq!(ids(&output), vec!["a", "e"]);
}

#[test]
fn empty_specification_returns_the_input_unchanged() {
    let input = corpus();
    let output = search(&input, &SearchFilters::none(), SortKey::Relevance);
    assert_eq!(output, input);
}

#[test]
fn empty_input_is_empty_output_for_any_specification() {
    let mut filters = SearchFilters::none();
    filters.query = Some("garden".to_string());
    filters.bedrooms_min = Some(2);
    assert!(search(&[], &filters, SortKey::DateDesc).is_empty());
}

#[test]
fn price_ties_keep_their_relative_input_order() {
    let input = corpus();
    let output = search(&input, &SearchFilters::none(), SortKey::PriceAsc);

    // "a" and "e" share a price; "a" precedes "e" in the input.
    let a = output.iter().position(|entry| entry.id.0 == "a").unwrap();
    let e = output.iter().position(|entry| entry.id.0 == "e").unwrap();
    assert!(a < e);
    assert_eq!(ids(&output), vec!["d", "a", "e", "b", "c"]);
}

#[test]
fn sorting_twice_matches_sorting_once() {
    let input = corpus();
    let once = search(&input, &SearchFilters::none(), SortKey::PriceDesc);
    let twice = search(&once, &SearchFilters::none(), SortKey::PriceDesc);
    assert_eq!(once, twice);
}

#[test]
fn date_sort_is_newest_first() {
    let input = corpus();
    let output = search(&input, &SearchFilters::none(), SortKey::DateDesc);
    assert_eq!(ids(&output), vec!["e", "d", "c", "b", "a"]);
}

#[test]
fn worked_example_from_the_browse_screen() {
    // Listings priced 100/80/100; price_min 90 then price ascending keeps
    // the two hundreds in input order.
    let input = vec![
        listing("x", "Lyon", ListingKind::ForRent, 100.0, 2),
        listing("y", "Lyon", ListingKind::ForRent, 80.0, 3),
        listing("z", "Lyon", ListingKind::ForRent, 100.0, 1),
    ];
    let mut filters = SearchFilters::none();
    filters.set_price_min_raw("90");

    let output = search(&input, &filters, SortKey::PriceAsc);
    assert_eq!(ids(&output), vec!["x", "z"]);
    assert_eq!(output[0].bedrooms, 2);
    assert_eq!(output[1].bedrooms, 1);
}

#[test]
fn missing_one_required_amenity_excludes_the_listing() {
    let mut furnished = listing("f", "Lyon", ListingKind::ForRent, 900.0, 1);
    furnished.amenities = vec!["Parking".to_string(), "Pool".to_string()];
    let input = vec![listing("a", "Lyon", ListingKind::ForRent, 900.0, 1), furnished];

    let mut filters = SearchFilters::none();
    filters.amenities = vec!["Parking".to_string(), "Pool".to_string()];

    let output = search(&input, &filters, SortKey::Relevance);
    assert_eq!(ids(&output), vec!["f"]);
}

#[test]
fn malformed_bound_text_places_no_restriction() {
    let input = corpus();
    let mut filters = SearchFilters::none();
    filters.set_price_max_raw("cheap");

    let output = search(&input, &filters, SortKey::Relevance);
    assert_eq!(output.len(), input.len());
}
