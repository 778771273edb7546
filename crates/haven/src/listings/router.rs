use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::repository::{ListingQuery, ListingRepository};
use super::service::{ListingDraft, ListingError, ListingService};
use crate::domain::{
    ListingCategory, ListingId, ListingKind, ListingStatus, OwnerSummary, UserId,
};
use crate::search::{SearchFilters, SortKey};

/// Router builder exposing HTTP endpoints for publishing and browsing
/// listings.
pub fn listing_router<R>(service: Arc<ListingService<R>>) -> Router
where
    R: ListingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings",
            post(publish_handler::<R>).get(browse_handler::<R>),
        )
        .route(
            "/api/v1/listings/:listing_id",
            get(get_handler::<R>).delete(remove_handler::<R>),
        )
        .route(
            "/api/v1/listings/:listing_id/status",
            post(status_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishRequest {
    pub(crate) owner: OwnerSummary,
    #[serde(flatten)]
    pub(crate) draft: ListingDraft,
}

/// Query-string filters. Numeric bounds arrive as raw text and are parsed
/// leniently; enum-valued fields are ignored when unrecognized so one
/// malformed parameter never empties the whole result set.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BrowseParams {
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
    pub(crate) status: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) price_min: Option<String>,
    pub(crate) price_max: Option<String>,
    pub(crate) bedrooms_min: Option<String>,
    pub(crate) bathrooms_min: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) q: Option<String>,
    pub(crate) category: Option<String>,
    /// Comma-separated amenity labels, all required.
    pub(crate) amenities: Option<String>,
    pub(crate) sort: Option<String>,
}

impl BrowseParams {
    pub(crate) fn into_search(self) -> (ListingQuery, SearchFilters, SortKey) {
        let kind = self.kind.as_deref().and_then(ListingKind::parse);
        let coarse = ListingQuery {
            kind,
            status: self.status.as_deref().and_then(ListingStatus::parse),
            city: self.city,
        };

        let mut filters = SearchFilters::none();
        filters.kind = kind;
        filters.category = self.category.as_deref().and_then(ListingCategory::parse);
        filters.location = self.location;
        filters.query = self.q;
        if let Some(raw) = self.price_min.as_deref() {
            filters.set_price_min_raw(raw);
        }
        if let Some(raw) = self.price_max.as_deref() {
            filters.set_price_max_raw(raw);
        }
        if let Some(raw) = self.bedrooms_min.as_deref() {
            filters.set_bedrooms_min_raw(raw);
        }
        if let Some(raw) = self.bathrooms_min.as_deref() {
            filters.set_bathrooms_min_raw(raw);
        }
        if let Some(raw) = self.amenities.as_deref() {
            filters.amenities = raw
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .collect();
        }

        let sort = self
            .sort
            .as_deref()
            .and_then(SortKey::parse)
            .unwrap_or_default();

        (coarse, filters, sort)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    pub(crate) editor: UserId,
    pub(crate) status: ListingStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditorParams {
    pub(crate) editor: UserId,
}

pub(crate) async fn publish_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    axum::Json(request): axum::Json<PublishRequest>,
) -> Response
where
    R: ListingRepository + 'static,
{
    match service.publish(request.owner, request.draft).await {
        Ok(listing) => (StatusCode::CREATED, axum::Json(listing)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn browse_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Query(params): Query<BrowseParams>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let (coarse, filters, sort) = params.into_search();
    match service.browse(&coarse, &filters, sort).await {
        Ok(listings) => (StatusCode::OK, axum::Json(listings)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
{
    match service.get(&ListingId(listing_id)).await {
        Ok(Some(listing)) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Ok(None) => not_found(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(listing_id): Path<String>,
    axum::Json(request): axum::Json<StatusRequest>,
) -> Response
where
    R: ListingRepository + 'static,
{
    match service
        .change_status(&request.editor, &ListingId(listing_id), request.status)
        .await
    {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_handler<R>(
    State(service): State<Arc<ListingService<R>>>,
    Path(listing_id): Path<String>,
    Query(params): Query<EditorParams>,
) -> Response
where
    R: ListingRepository + 'static,
{
    match service.remove(&params.editor, &ListingId(listing_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn not_found() -> Response {
    let payload = json!({ "error": "listing not found" });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn error_response(error: ListingError) -> Response {
    let status = match &error {
        ListingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ListingError::NotFound => StatusCode::NOT_FOUND,
        ListingError::NotOwner => StatusCode::FORBIDDEN,
        ListingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
