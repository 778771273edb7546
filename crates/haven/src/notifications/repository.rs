use async_trait::async_trait;

use crate::domain::{Notification, NotificationId, UserId};
use crate::live::Snapshots;
use crate::store::StoreError;

/// Storage abstraction over the `notifications` collection.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<Notification, StoreError>;
    /// Most recent notifications for one user, newest first, capped at
    /// `limit`.
    async fn recent(&self, user: &UserId, limit: usize) -> Result<Vec<Notification>, StoreError>;
    async fn mark_read(&self, id: &NotificationId) -> Result<(), StoreError>;
    async fn unread_count(&self, user: &UserId) -> Result<usize, StoreError>;
    /// Live full-snapshot feed of a user's recent notifications, released
    /// when the handle is dropped.
    async fn watch_recent(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Snapshots<Vec<Notification>>, StoreError>;
}
