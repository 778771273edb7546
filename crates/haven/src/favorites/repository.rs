use async_trait::async_trait;

use crate::domain::{Favorite, ListingId, UserId};
use crate::store::StoreError;

/// Storage abstraction over the `favorites` collection. Implementations
/// enforce at most one row per (user, listing) pair; adding an existing
/// pair and removing a missing one are both no-ops, matching a
/// last-write-wins store.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn add(&self, favorite: Favorite) -> Result<(), StoreError>;
    async fn remove(&self, user: &UserId, listing: &ListingId) -> Result<(), StoreError>;
    /// All favorites of one user, in insertion order.
    async fn for_user(&self, user: &UserId) -> Result<Vec<Favorite>, StoreError>;
}
