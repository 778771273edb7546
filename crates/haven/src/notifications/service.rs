use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::repository::NotificationRepository;
use crate::domain::{Notification, NotificationId, NotificationKind, UserId};
use crate::live::Snapshots;
use crate::store::StoreError;

/// In-app feeds show at most this many entries.
pub const RECENT_LIMIT: usize = 50;

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("ntf-{id:06}"))
}

/// Creates and reads per-user in-app notifications.
pub struct NotificationService<R> {
    repository: Arc<R>,
}

impl<R> NotificationService<R>
where
    R: NotificationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn notify(
        &self,
        recipient: &UserId,
        kind: NotificationKind,
        title: &str,
        body: &str,
        related_id: Option<String>,
    ) -> Result<Notification, StoreError> {
        let notification = Notification {
            id: next_notification_id(),
            user_id: recipient.clone(),
            kind,
            title: title.to_string(),
            body: body.to_string(),
            related_id,
            read: false,
            created_at: Utc::now(),
        };
        self.repository.insert(notification).await
    }

    pub async fn recent(&self, user: &UserId) -> Result<Vec<Notification>, StoreError> {
        self.repository.recent(user, RECENT_LIMIT).await
    }

    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), StoreError> {
        self.repository.mark_read(id).await
    }

    /// Marks every currently unread entry, one write per notification.
    pub async fn mark_all_read(&self, user: &UserId) -> Result<(), StoreError> {
        let recent = self.repository.recent(user, RECENT_LIMIT).await?;
        for notification in recent.into_iter().filter(|entry| !entry.read) {
            self.repository.mark_read(&notification.id).await?;
        }
        Ok(())
    }

    pub async fn unread_count(&self, user: &UserId) -> Result<usize, StoreError> {
        self.repository.unread_count(user).await
    }

    /// Live feed for the notification bell; drop the handle when the
    /// screen goes away.
    pub async fn feed(&self, user: &UserId) -> Result<Snapshots<Vec<Notification>>, StoreError> {
        self.repository.watch_recent(user, RECENT_LIMIT).await
    }
}
