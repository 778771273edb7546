use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::repository::{ListingQuery, ListingRepository};
use crate::domain::{
    Listing, ListingCategory, ListingId, ListingKind, ListingLocation, ListingStatus,
    OwnerSummary, RentPeriod, UserId,
};
use crate::search::{self, SearchFilters, SortKey};
use crate::store::StoreError;

/// Submission payload for a new listing. Identifier, timestamps, and
/// initial status are stamped by the service at publish time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub kind: ListingKind,
    pub category: ListingCategory,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub location: ListingLocation,
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub rent_period: Option<RentPeriod>,
    #[serde(default)]
    pub featured: bool,
}

/// Partial update applied by the owner; absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<ListingCategory>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area: Option<f64>,
    pub location: Option<ListingLocation>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub rent_period: Option<RentPeriod>,
    pub featured: Option<bool>,
}

/// Caught before any repository call; never reaches the backend.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("title is required")]
    MissingTitle,
    #[error("description is required")]
    MissingDescription,
    #[error("city is required")]
    MissingCity,
    #[error("price must be a non-negative number")]
    InvalidPrice,
    #[error("floor area must be greater than zero")]
    InvalidArea,
    #[error("at least one photo is required")]
    NoImages,
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error("listing not found")]
    NotFound,
    #[error("only the owner may modify a listing")]
    NotOwner,
    #[error(transparent)]
    Store(#[from] StoreError),
}

static LISTING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_listing_id() -> ListingId {
    let id = LISTING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ListingId(format!("lst-{id:06}"))
}

/// Publish, edit, and browse listings on behalf of their owners.
pub struct ListingService<R> {
    repository: Arc<R>,
}

impl<R> ListingService<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Validates the draft, stamps identity and timestamps, and stores
    /// the listing as `available`.
    pub async fn publish(
        &self,
        owner: OwnerSummary,
        draft: ListingDraft,
    ) -> Result<Listing, ListingError> {
        validate_draft(&draft)?;

        let now = Utc::now();
        let listing = Listing {
            id: next_listing_id(),
            title: draft.title,
            description: draft.description,
            price: draft.price,
            kind: draft.kind,
            category: draft.category,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            area: draft.area,
            location: draft.location,
            images: draft.images,
            amenities: draft.amenities,
            owner,
            created_at: now,
            updated_at: now,
            featured: draft.featured,
            rent_period: draft.rent_period,
            status: ListingStatus::Available,
        };

        let stored = self.repository.insert(listing).await?;
        Ok(stored)
    }

    /// Applies a partial edit; only the owner may edit, and `updated_at`
    /// is bumped on success.
    pub async fn update(
        &self,
        editor: &UserId,
        id: &ListingId,
        changes: ListingChanges,
    ) -> Result<Listing, ListingError> {
        let mut listing = self.fetch_owned(editor, id).await?;
        apply_changes(&mut listing, changes)?;
        listing.updated_at = Utc::now();

        self.repository.update(listing.clone()).await?;
        Ok(listing)
    }

    pub async fn change_status(
        &self,
        editor: &UserId,
        id: &ListingId,
        status: ListingStatus,
    ) -> Result<Listing, ListingError> {
        let mut listing = self.fetch_owned(editor, id).await?;
        listing.status = status;
        listing.updated_at = Utc::now();

        self.repository.update(listing.clone()).await?;
        Ok(listing)
    }

    pub async fn remove(&self, editor: &UserId, id: &ListingId) -> Result<(), ListingError> {
        let listing = self.fetch_owned(editor, id).await?;
        self.repository.delete(&listing.id).await?;
        Ok(())
    }

    pub async fn get(&self, id: &ListingId) -> Result<Option<Listing>, ListingError> {
        Ok(self.repository.fetch(id).await?)
    }

    pub async fn for_owner(&self, owner: &UserId) -> Result<Vec<Listing>, ListingError> {
        Ok(self.repository.for_owner(owner).await?)
    }

    /// Coarse store-side query followed by the client-side
    /// filter-and-sort pass.
    pub async fn browse(
        &self,
        coarse: &ListingQuery,
        filters: &SearchFilters,
        sort: SortKey,
    ) -> Result<Vec<Listing>, ListingError> {
        let loaded = self.repository.query(coarse).await?;
        Ok(search::search(&loaded, filters, sort))
    }

    async fn fetch_owned(&self, editor: &UserId, id: &ListingId) -> Result<Listing, ListingError> {
        let listing = self
            .repository
            .fetch(id)
            .await?
            .ok_or(ListingError::NotFound)?;
        if listing.owner.id != *editor {
            return Err(ListingError::NotOwner);
        }
        Ok(listing)
    }
}

fn validate_draft(draft: &ListingDraft) -> Result<(), ListingValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ListingValidationError::MissingTitle);
    }
    if draft.description.trim().is_empty() {
        return Err(ListingValidationError::MissingDescription);
    }
    if draft.location.city.trim().is_empty() {
        return Err(ListingValidationError::MissingCity);
    }
    if !draft.price.is_finite() || draft.price < 0.0 {
        return Err(ListingValidationError::InvalidPrice);
    }
    if !draft.area.is_finite() || draft.area <= 0.0 {
        return Err(ListingValidationError::InvalidArea);
    }
    if draft.images.is_empty() {
        return Err(ListingValidationError::NoImages);
    }
    Ok(())
}

fn apply_changes(
    listing: &mut Listing,
    changes: ListingChanges,
) -> Result<(), ListingValidationError> {
    if let Some(title) = changes.title {
        if title.trim().is_empty() {
            return Err(ListingValidationError::MissingTitle);
        }
        listing.title = title;
    }
    if let Some(description) = changes.description {
        if description.trim().is_empty() {
            return Err(ListingValidationError::MissingDescription);
        }
        listing.description = description;
    }
    if let Some(price) = changes.price {
        if !price.is_finite() || price < 0.0 {
            return Err(ListingValidationError::InvalidPrice);
        }
        listing.price = price;
    }
    if let Some(area) = changes.area {
        if !area.is_finite() || area <= 0.0 {
            return Err(ListingValidationError::InvalidArea);
        }
        listing.area = area;
    }
    if let Some(images) = changes.images {
        if images.is_empty() {
            return Err(ListingValidationError::NoImages);
        }
        listing.images = images;
    }
    if let Some(location) = changes.location {
        if location.city.trim().is_empty() {
            return Err(ListingValidationError::MissingCity);
        }
        listing.location = location;
    }
    if let Some(category) = changes.category {
        listing.category = category;
    }
    if let Some(bedrooms) = changes.bedrooms {
        listing.bedrooms = bedrooms;
    }
    if let Some(bathrooms) = changes.bathrooms {
        listing.bathrooms = bathrooms;
    }
    if let Some(amenities) = changes.amenities {
        listing.amenities = amenities;
    }
    if let Some(rent_period) = changes.rent_period {
        listing.rent_period = Some(rent_period);
    }
    if let Some(featured) = changes.featured {
        listing.featured = featured;
    }
    Ok(())
}
