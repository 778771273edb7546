//! Integration specifications for the listing lifecycle: publish
//! validation, owner-only mutation, status changes, and the browse
//! pipeline end to end through the HTTP router.

mod common {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use haven::domain::{
        GeoPoint, Listing, ListingCategory, ListingId, ListingKind, ListingLocation,
        OwnerSummary, RentPeriod, UserId,
    };
    use haven::listings::{ListingDraft, ListingQuery, ListingRepository, ListingService};
    use haven::store::StoreError;

    #[derive(Default, Clone)]
    pub(super) struct MemoryListings {
        pub(super) records: Arc<Mutex<Vec<Listing>>>,
    }

    #[async_trait]
    impl ListingRepository for MemoryListings {
        async fn insert(&self, listing: Listing) -> Result<Listing, StoreError> {
            let mut guard = self.records.lock().expect("lock");
            if guard.iter().any(|existing| existing.id == listing.id) {
                return Err(StoreError::Conflict);
            }
            guard.push(listing.clone());
            Ok(listing)
        }

        async fn update(&self, listing: Listing) -> Result<(), StoreError> {
            let mut guard = self.records.lock().expect("lock");
            match guard.iter_mut().find(|existing| existing.id == listing.id) {
                Some(existing) => {
                    *existing = listing;
                    Ok(())
                }
                None => Err(StoreError::NotFound),
            }
        }

        async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
            let mut guard = self.records.lock().expect("lock");
            let before = guard.len();
            guard.retain(|existing| existing.id != *id);
            if guard.len() == before {
                return Err(StoreError::NotFound);
            }
            Ok(())
        }

        async fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
            let guard = self.records.lock().expect("lock");
            Ok(guard.iter().find(|existing| existing.id == *id).cloned())
        }

        async fn for_owner(&self, owner: &UserId) -> Result<Vec<Listing>, StoreError> {
            let guard = self.records.lock().expect("lock");
            let mut owned: Vec<Listing> = guard
                .iter()
                .filter(|listing| listing.owner.id == *owner)
                .cloned()
                .collect();
            owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(owned)
        }

        async fn query(&self, query: &ListingQuery) -> Result<Vec<Listing>, StoreError> {
            let guard = self.records.lock().expect("lock");
            let mut matched: Vec<Listing> = guard
                .iter()
                .filter(|listing| {
                    query.kind.map_or(true, |kind| listing.kind == kind)
                        && query.status.map_or(true, |status| listing.status == status)
                        && query
                            .city
                            .as_deref()
                            .map_or(true, |city| listing.location.city == city)
                })
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(matched)
        }
    }

    pub(super) fn owner() -> OwnerSummary {
        OwnerSummary {
            id: UserId("usr-nadia".to_string()),
            display_name: "Nadia".to_string(),
            photo_url: None,
        }
    }

    pub(super) fn stranger() -> UserId {
        UserId("usr-mallory".to_string())
    }

    pub(super) fn draft(title: &str, city: &str, price: f64) -> ListingDraft {
        ListingDraft {
            title: title.to_string(),
            description: "Sunlit rooms and a quiet street".to_string(),
            price,
            kind: ListingKind::ForRent,
            category: ListingCategory::Apartment,
            bedrooms: 2,
            bathrooms: 1,
            area: 54.0,
            location: ListingLocation {
                address: format!("3 Rue Neuve, {city}"),
                city: city.to_string(),
                country: "France".to_string(),
                point: GeoPoint {
                    latitude: 45.76,
                    longitude: 4.83,
                },
            },
            images: vec!["https://images.example/a.jpg".to_string()],
            amenities: vec!["Parking".to_string()],
            rent_period: Some(RentPeriod::Month),
            featured: false,
        }
    }

    pub(super) fn build_service() -> (ListingService<MemoryListings>, Arc<MemoryListings>) {
        let repository = Arc::new(MemoryListings::default());
        (ListingService::new(repository.clone()), repository)
    }
}

mod lifecycle {
    use super::common::*;
    use haven::domain::ListingStatus;
    use haven::listings::{ListingChanges, ListingError, ListingQuery, ListingValidationError};
    use haven::search::{SearchFilters, SortKey};

    #[tokio::test]
    async fn publish_stamps_identity_and_defaults() {
        let (service, _) = build_service();
        let listing = service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");

        assert!(listing.id.0.starts_with("lst-"));
        assert_eq!(listing.status, ListingStatus::Available);
        assert_eq!(listing.created_at, listing.updated_at);
        assert_eq!(listing.owner.id, owner().id);
    }

    #[tokio::test]
    async fn publish_requires_at_least_one_photo() {
        let (service, repository) = build_service();
        let mut bad = draft("No photos", "Lyon", 700.0);
        bad.images.clear();

        match service.publish(owner(), bad).await {
            Err(ListingError::Validation(ListingValidationError::NoImages)) => {}
            other => panic!("expected missing-photo rejection, got {other:?}"),
        }
        assert!(repository.records.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn publish_rejects_negative_prices() {
        let (service, _) = build_service();
        let bad = draft("Negative", "Lyon", -5.0);

        assert!(matches!(
            service.publish(owner(), bad).await,
            Err(ListingError::Validation(ListingValidationError::InvalidPrice))
        ));
    }

    #[tokio::test]
    async fn only_the_owner_may_edit() {
        let (service, _) = build_service();
        let listing = service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");

        let mut changes = ListingChanges::default();
        changes.price = Some(1000.0);

        let result = service.update(&stranger(), &listing.id, changes).await;
        assert!(matches!(result, Err(ListingError::NotOwner)));
    }

    #[tokio::test]
    async fn owner_edit_bumps_updated_at() {
        let (service, _) = build_service();
        let listing = service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");

        let mut changes = ListingChanges::default();
        changes.price = Some(1020.0);
        let updated = service
            .update(&owner().id, &listing.id, changes)
            .await
            .expect("edit");

        assert_eq!(updated.price, 1020.0);
        assert!(updated.updated_at >= listing.updated_at);
        assert_eq!(updated.created_at, listing.created_at);
    }

    #[tokio::test]
    async fn edits_cannot_clear_the_photo_set() {
        let (service, _) = build_service();
        let listing = service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");

        let mut changes = ListingChanges::default();
        changes.images = Some(Vec::new());

        assert!(matches!(
            service.update(&owner().id, &listing.id, changes).await,
            Err(ListingError::Validation(ListingValidationError::NoImages))
        ));
    }

    #[tokio::test]
    async fn status_change_marks_a_listing_rented() {
        let (service, _) = build_service();
        let listing = service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");

        let rented = service
            .change_status(&owner().id, &listing.id, ListingStatus::Rented)
            .await
            .expect("status change");
        assert_eq!(rented.status, ListingStatus::Rented);
    }

    #[tokio::test]
    async fn remove_deletes_only_for_the_owner() {
        let (service, repository) = build_service();
        let listing = service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");

        assert!(matches!(
            service.remove(&stranger(), &listing.id).await,
            Err(ListingError::NotOwner)
        ));
        service
            .remove(&owner().id, &listing.id)
            .await
            .expect("owner removes");
        assert!(repository.records.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn browse_layers_search_over_the_coarse_query() {
        let (service, _) = build_service();
        service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");
        service
            .publish(owner(), draft("Compact studio", "Lyon", 640.0))
            .await
            .expect("publish");
        service
            .publish(owner(), draft("Harbour flat", "Marseille", 870.0))
            .await
            .expect("publish");

        let coarse = ListingQuery {
            kind: None,
            status: None,
            city: Some("Lyon".to_string()),
        };
        let mut filters = SearchFilters::none();
        filters.set_price_max_raw("1000");

        let results = service
            .browse(&coarse, &filters, SortKey::PriceAsc)
            .await
            .expect("browse");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Compact studio");
        assert_eq!(results[1].title, "Bright two-bedroom");
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use haven::listings::{listing_router, ListingService};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn build_router() -> (axum::Router, Arc<ListingService<MemoryListings>>) {
        let (service, _) = build_service();
        let service = Arc::new(service);
        (listing_router(service.clone()), service)
    }

    fn publish_body(title: &str, price: f64) -> Value {
        let mut body = serde_json::to_value(draft(title, "Lyon", price)).expect("serialize");
        body["owner"] = json!({
            "id": "usr-nadia",
            "display_name": "Nadia",
        });
        body
    }

    #[tokio::test]
    async fn post_listings_returns_created_listing() {
        let (router, _) = build_router();

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/listings")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&publish_body("Bright two-bedroom", 980.0))
                    .expect("serialize request"),
            ))
            .expect("request");

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.get("status"), Some(&json!("available")));
        assert!(payload
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .starts_with("lst-"));
    }

    #[tokio::test]
    async fn post_listings_rejects_a_photoless_draft() {
        let (router, _) = build_router();
        let mut body = publish_body("No photos", 700.0);
        body["images"] = json!([]);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/listings")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
            .expect("request");

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn browse_applies_lenient_bounds_and_sorting() {
        let (router, service) = build_router();
        service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");
        service
            .publish(owner(), draft("Compact studio", "Lyon", 640.0))
            .await
            .expect("publish");

        // price_min is malformed on purpose: it must not restrict.
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/listings?price_min=abc&sort=price_asc")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let titles: Vec<&str> = payload
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|entry| entry.get("title").and_then(Value::as_str))
            .collect();
        assert_eq!(titles, vec!["Compact studio", "Bright two-bedroom"]);
    }

    #[tokio::test]
    async fn get_unknown_listing_is_a_clean_404() {
        let (router, _) = build_router();
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/listings/lst-999999")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_endpoint_enforces_ownership() {
        let (router, service) = build_router();
        let listing = service
            .publish(owner(), draft("Bright two-bedroom", "Lyon", 980.0))
            .await
            .expect("publish");

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/listings/{}/status", listing.id.0))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "editor": "usr-mallory",
                    "status": "rented",
                }))
                .expect("serialize"),
            ))
            .expect("request");

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
