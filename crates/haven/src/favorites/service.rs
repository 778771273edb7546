use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use super::repository::FavoriteRepository;
use crate::domain::{Favorite, ListingId, UserId};
use crate::store::StoreError;

/// Direction a toggle took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteToggle {
    Added,
    Removed,
}

/// The current user's favorite set, held as an optimistic local cache in
/// front of the remote store.
///
/// `toggle` updates the local set before the remote write completes so
/// the UI reflects the tap immediately. The remote write is
/// read-modify-write with no transactional guarantee: concurrent toggles
/// of the same pair from two devices race and the last write wins. A
/// failed write surfaces a non-fatal error and the local set is NOT
/// rolled back; it may diverge from the store until the next `refresh`.
pub struct FavoritesService<R> {
    user: UserId,
    repository: Arc<R>,
    local: Mutex<HashSet<ListingId>>,
}

impl<R> FavoritesService<R>
where
    R: FavoriteRepository + 'static,
{
    /// Starts with an empty local set; call `refresh` to hydrate it from
    /// the store.
    pub fn new(user: UserId, repository: Arc<R>) -> Self {
        Self {
            user,
            repository,
            local: Mutex::new(HashSet::new()),
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Replaces the local set with the authoritative remote state. This
    /// is the reconciliation point for any divergence accumulated by
    /// failed or racing writes.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let favorites = self.repository.for_user(&self.user).await?;
        let ids: HashSet<ListingId> = favorites
            .into_iter()
            .map(|favorite| favorite.listing_id)
            .collect();
        *self.local.lock().expect("favorites mutex poisoned") = ids;
        Ok(())
    }

    /// Flips membership for one listing: local set first, then the
    /// remote association.
    pub async fn toggle(&self, listing: &ListingId) -> Result<FavoriteToggle, StoreError> {
        let direction = {
            let mut local = self.local.lock().expect("favorites mutex poisoned");
            if local.remove(listing) {
                FavoriteToggle::Removed
            } else {
                local.insert(listing.clone());
                FavoriteToggle::Added
            }
        };

        let write = match direction {
            FavoriteToggle::Added => {
                self.repository
                    .add(Favorite {
                        user_id: self.user.clone(),
                        listing_id: listing.clone(),
                        added_at: Utc::now(),
                    })
                    .await
            }
            FavoriteToggle::Removed => self.repository.remove(&self.user, listing).await,
        };

        if let Err(error) = write {
            // Local state intentionally keeps the optimistic value; the
            // next refresh reconciles against the store.
            warn!(user = %self.user, listing = %listing, %error, "favorite write failed");
            return Err(error);
        }

        Ok(direction)
    }

    /// Membership test against the local set; O(1), no I/O.
    pub fn is_favorite(&self, listing: &ListingId) -> bool {
        self.local
            .lock()
            .expect("favorites mutex poisoned")
            .contains(listing)
    }

    /// Snapshot of the local set.
    pub fn favorites(&self) -> Vec<ListingId> {
        self.local
            .lock()
            .expect("favorites mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }
}
