use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use haven::auth::{AuthError, AuthProvider, AuthUser, ProfileUpdate};
use haven::domain::{
    Conversation, ConversationId, Favorite, Listing, ListingId, Message, MessageId, Notification,
    NotificationId, UserId,
};
use haven::favorites::FavoriteRepository;
use haven::listings::{ListingQuery, ListingRepository};
use haven::live::{Snapshots, SubscriptionGuard};
use haven::messaging::MessagingRepository;
use haven::domain::UserProfile;
use haven::notifications::NotificationRepository;
use haven::profiles::ProfileRepository;
use haven::store::StoreError;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::watch;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory stand-in for the external document store's `listings`
/// collection.
#[derive(Default, Clone)]
pub(crate) struct InMemoryListingStore {
    records: Arc<Mutex<Vec<Listing>>>,
}

#[async_trait]
impl ListingRepository for InMemoryListingStore {
    async fn insert(&self, listing: Listing) -> Result<Listing, StoreError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        if guard.iter().any(|existing| existing.id == listing.id) {
            return Err(StoreError::Conflict);
        }
        guard.push(listing.clone());
        Ok(listing)
    }

    async fn update(&self, listing: Listing) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == listing.id) {
            Some(existing) => {
                *existing = listing;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        let before = guard.len();
        guard.retain(|existing| existing.id != *id);
        if guard.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        Ok(guard.iter().find(|existing| existing.id == *id).cloned())
    }

    async fn for_owner(&self, owner: &UserId) -> Result<Vec<Listing>, StoreError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        let mut owned: Vec<Listing> = guard
            .iter()
            .filter(|listing| listing.owner.id == *owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn query(&self, query: &ListingQuery) -> Result<Vec<Listing>, StoreError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
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

/// In-memory `favorites` collection; keeps at most one row per
/// (user, listing) pair.
#[derive(Default, Clone)]
pub(crate) struct InMemoryFavoriteStore {
    rows: Arc<Mutex<Vec<Favorite>>>,
}

#[async_trait]
impl FavoriteRepository for InMemoryFavoriteStore {
    async fn add(&self, favorite: Favorite) -> Result<(), StoreError> {
        let mut guard = self.rows.lock().expect("favorite mutex poisoned");
        let exists = guard
            .iter()
            .any(|row| row.user_id == favorite.user_id && row.listing_id == favorite.listing_id);
        if !exists {
            guard.push(favorite);
        }
        Ok(())
    }

    async fn remove(&self, user: &UserId, listing: &ListingId) -> Result<(), StoreError> {
        let mut guard = self.rows.lock().expect("favorite mutex poisoned");
        guard.retain(|row| !(row.user_id == *user && row.listing_id == *listing));
        Ok(())
    }

    async fn for_user(&self, user: &UserId) -> Result<Vec<Favorite>, StoreError> {
        let guard = self.rows.lock().expect("favorite mutex poisoned");
        Ok(guard
            .iter()
            .filter(|row| row.user_id == *user)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct MessagingState {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    watchers: HashMap<u64, (ConversationId, watch::Sender<Vec<Message>>)>,
    next_watcher: u64,
}

impl MessagingState {
    fn thread(&self, conversation: &ConversationId) -> Vec<Message> {
        let mut thread: Vec<Message> = self
            .messages
            .iter()
            .filter(|message| message.conversation_id == *conversation)
            .cloned()
            .collect();
        thread.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        thread
    }

    fn publish(&self, conversation: &ConversationId) {
        let snapshot = self.thread(conversation);
        for (topic, sender) in self.watchers.values() {
            if topic == conversation {
                let _ = sender.send(snapshot.clone());
            }
        }
    }
}

/// In-memory `conversations` and `messages` collections with live
/// full-snapshot subscriptions per conversation.
#[derive(Default, Clone)]
pub(crate) struct InMemoryMessagingStore {
    inner: Arc<Mutex<MessagingState>>,
}

#[async_trait]
impl MessagingRepository for InMemoryMessagingStore {
    async fn insert_conversation(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, StoreError> {
        let mut state = self.inner.lock().expect("messaging mutex poisoned");
        if state
            .conversations
            .iter()
            .any(|existing| existing.id == conversation.id)
        {
            return Err(StoreError::Conflict);
        }
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn update_conversation(&self, conversation: Conversation) -> Result<(), StoreError> {
        let mut state = self.inner.lock().expect("messaging mutex poisoned");
        match state
            .conversations
            .iter_mut()
            .find(|existing| existing.id == conversation.id)
        {
            Some(existing) => {
                *existing = conversation;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn fetch_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let state = self.inner.lock().expect("messaging mutex poisoned");
        Ok(state
            .conversations
            .iter()
            .find(|existing| existing.id == *id)
            .cloned())
    }

    async fn conversations_for(&self, user: &UserId) -> Result<Vec<Conversation>, StoreError> {
        let state = self.inner.lock().expect("messaging mutex poisoned");
        let mut inbox: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|conversation| conversation.involves(user))
            .cloned()
            .collect();
        inbox.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(inbox)
    }

    async fn conversation_for_pair(
        &self,
        a: &UserId,
        b: &UserId,
        listing: &ListingId,
    ) -> Result<Option<Conversation>, StoreError> {
        let state = self.inner.lock().expect("messaging mutex poisoned");
        Ok(state
            .conversations
            .iter()
            .find(|conversation| {
                conversation.listing_id == *listing
                    && conversation.involves(a)
                    && conversation.involves(b)
            })
            .cloned())
    }

    async fn append_message(&self, message: Message) -> Result<Message, StoreError> {
        let mut state = self.inner.lock().expect("messaging mutex poisoned");
        let conversation = message.conversation_id.clone();
        state.messages.push(message.clone());
        state.publish(&conversation);
        Ok(message)
    }

    async fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>, StoreError> {
        let state = self.inner.lock().expect("messaging mutex poisoned");
        Ok(state.thread(conversation))
    }

    async fn set_message_read(&self, id: &MessageId) -> Result<(), StoreError> {
        let mut state = self.inner.lock().expect("messaging mutex poisoned");
        let conversation = match state.messages.iter_mut().find(|message| message.id == *id) {
            Some(message) => {
                message.read = true;
                message.conversation_id.clone()
            }
            None => return Err(StoreError::NotFound),
        };
        state.publish(&conversation);
        Ok(())
    }

    async fn watch_messages(
        &self,
        conversation: &ConversationId,
    ) -> Result<Snapshots<Vec<Message>>, StoreError> {
        let mut state = self.inner.lock().expect("messaging mutex poisoned");
        let (sender, receiver) = watch::channel(state.thread(conversation));
        let id = state.next_watcher;
        state.next_watcher += 1;
        state.watchers.insert(id, (conversation.clone(), sender));

        let inner = self.inner.clone();
        let guard = SubscriptionGuard::new(move || {
            if let Ok(mut state) = inner.lock() {
                state.watchers.remove(&id);
            }
        });
        Ok(Snapshots::new(receiver, guard))
    }
}

#[derive(Default)]
struct NotificationState {
    rows: Vec<Notification>,
    watchers: HashMap<u64, (UserId, usize, watch::Sender<Vec<Notification>>)>,
    next_watcher: u64,
}

impl NotificationState {
    fn recent(&self, user: &UserId, limit: usize) -> Vec<Notification> {
        let mut recent: Vec<Notification> = self
            .rows
            .iter()
            .filter(|row| row.user_id == *user)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        recent
    }

    fn publish(&self, user: &UserId) {
        for (topic, limit, sender) in self.watchers.values() {
            if topic == user {
                let _ = sender.send(self.recent(user, *limit));
            }
        }
    }
}

/// In-memory `notifications` collection with per-user live feeds.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationStore {
    inner: Arc<Mutex<NotificationState>>,
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationStore {
    async fn insert(&self, notification: Notification) -> Result<Notification, StoreError> {
        let mut state = self.inner.lock().expect("notification mutex poisoned");
        let recipient = notification.user_id.clone();
        state.rows.push(notification.clone());
        state.publish(&recipient);
        Ok(notification)
    }

    async fn recent(&self, user: &UserId, limit: usize) -> Result<Vec<Notification>, StoreError> {
        let state = self.inner.lock().expect("notification mutex poisoned");
        Ok(state.recent(user, limit))
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), StoreError> {
        let mut state = self.inner.lock().expect("notification mutex poisoned");
        let recipient = match state.rows.iter_mut().find(|row| row.id == *id) {
            Some(row) => {
                row.read = true;
                row.user_id.clone()
            }
            None => return Err(StoreError::NotFound),
        };
        state.publish(&recipient);
        Ok(())
    }

    async fn unread_count(&self, user: &UserId) -> Result<usize, StoreError> {
        let state = self.inner.lock().expect("notification mutex poisoned");
        Ok(state
            .rows
            .iter()
            .filter(|row| row.user_id == *user && !row.read)
            .count())
    }

    async fn watch_recent(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Snapshots<Vec<Notification>>, StoreError> {
        let mut state = self.inner.lock().expect("notification mutex poisoned");
        let (sender, receiver) = watch::channel(state.recent(user, limit));
        let id = state.next_watcher;
        state.next_watcher += 1;
        state.watchers.insert(id, (user.clone(), limit, sender));

        let inner = self.inner.clone();
        let guard = SubscriptionGuard::new(move || {
            if let Ok(mut state) = inner.lock() {
                state.watchers.remove(&id);
            }
        });
        Ok(Snapshots::new(receiver, guard))
    }
}

/// In-memory `users` collection.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    rows: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

#[async_trait]
impl ProfileRepository for InMemoryProfileStore {
    async fn upsert(&self, profile: UserProfile) -> Result<(), StoreError> {
        self.rows
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.id.clone(), profile);
        Ok(())
    }

    async fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .rows
            .lock()
            .expect("profile mutex poisoned")
            .get(id)
            .cloned())
    }
}

static ACCOUNT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    let id = ACCOUNT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("usr-{id:06}"))
}

#[derive(Default)]
struct AuthState {
    accounts: HashMap<String, (String, AuthUser)>,
}

/// Demo-grade auth provider: accounts live in memory and a single
/// session slot feeds the auth-state stream.
pub(crate) struct InMemoryAuthDirectory {
    state: Mutex<AuthState>,
    session: watch::Sender<Option<AuthUser>>,
}

impl Default for InMemoryAuthDirectory {
    fn default() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            state: Mutex::new(AuthState::default()),
            session,
        }
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthDirectory {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError> {
        let email = email.trim().to_lowercase();
        let mut state = self.state.lock().expect("auth mutex poisoned");
        if state.accounts.contains_key(&email) {
            return Err(AuthError::EmailInUse);
        }
        let user = AuthUser {
            id: next_user_id(),
            email: email.clone(),
            display_name: display_name.to_string(),
            photo_url: None,
        };
        state
            .accounts
            .insert(email, (password.to_string(), user.clone()));
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = email.trim().to_lowercase();
        let state = self.state.lock().expect("auth mutex poisoned");
        let (stored_password, user) =
            state.accounts.get(&email).ok_or(AuthError::NoSuchAccount)?;
        if stored_password != password {
            return Err(AuthError::WrongCredential);
        }
        let user = user.clone();
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.send_replace(None);
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim().to_lowercase();
        let state = self.state.lock().expect("auth mutex poisoned");
        if !state.accounts.contains_key(&email) {
            return Err(AuthError::NoSuchAccount);
        }
        Ok(())
    }

    async fn update_profile(&self, updates: ProfileUpdate) -> Result<AuthUser, AuthError> {
        let current = self.session.borrow().clone();
        let mut user =
            current.ok_or_else(|| AuthError::Backend("no active session".to_string()))?;

        if let Some(display_name) = updates.display_name {
            user.display_name = display_name;
        }
        if let Some(photo_url) = updates.photo_url {
            user.photo_url = Some(photo_url);
        }

        let mut state = self.state.lock().expect("auth mutex poisoned");
        if let Some((_, stored)) = state.accounts.get_mut(&user.email) {
            *stored = user.clone();
        }
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    fn sessions(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }
}
