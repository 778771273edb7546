use async_trait::async_trait;

use crate::domain::{Listing, ListingId, ListingKind, ListingStatus, UserId};
use crate::store::StoreError;

/// Coarse predicates the backing store can evaluate server-side
/// (equality only). Price bands and text matching are refined client-side
/// by the search engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub kind: Option<ListingKind>,
    pub status: Option<ListingStatus>,
    pub city: Option<String>,
}

/// Storage abstraction over the external document store's `listings`
/// collection, so the service can be exercised against an in-memory
/// implementation.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn insert(&self, listing: Listing) -> Result<Listing, StoreError>;
    async fn update(&self, listing: Listing) -> Result<(), StoreError>;
    async fn delete(&self, id: &ListingId) -> Result<(), StoreError>;
    async fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;
    /// Listings owned by one user, most recently created first.
    async fn for_owner(&self, owner: &UserId) -> Result<Vec<Listing>, StoreError>;
    /// Coarse query, most recently created first.
    async fn query(&self, query: &ListingQuery) -> Result<Vec<Listing>, StoreError>;
}
