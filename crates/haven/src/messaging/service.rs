use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::repository::MessagingRepository;
use crate::domain::{Conversation, ConversationId, ListingId, Message, MessageId, UserId};
use crate::live::Snapshots;
use crate::store::StoreError;

/// Listing context denormalized onto a conversation at creation time so
/// the inbox renders without a listing read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSeed {
    pub listing_id: ListingId,
    pub listing_title: String,
    #[serde(default)]
    pub listing_image: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("conversation not found")]
    ConversationNotFound,
    #[error("sender is not part of this conversation")]
    NotParticipant,
    #[error("message text is empty")]
    EmptyMessage,
    #[error(transparent)]
    Store(#[from] StoreError),
}

static CONVERSATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static MESSAGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_conversation_id() -> ConversationId {
    let id = CONVERSATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ConversationId(format!("con-{id:06}"))
}

fn next_message_id() -> MessageId {
    let id = MESSAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MessageId(format!("msg-{id:06}"))
}

/// Finds or creates conversations, appends messages, and maintains the
/// denormalized preview and unread counters.
pub struct MessagingService<R> {
    repository: Arc<R>,
}

impl<R> MessagingService<R>
where
    R: MessagingRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// A conversation is uniquely identified by the unordered participant
    /// pair plus the listing. Reuses an existing one, otherwise creates a
    /// fresh conversation with both unread counters at zero.
    pub async fn find_or_create(
        &self,
        me: &UserId,
        other: &UserId,
        seed: ConversationSeed,
    ) -> Result<Conversation, MessagingError> {
        if let Some(existing) = self
            .repository
            .conversation_for_pair(me, other, &seed.listing_id)
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let mut unread = BTreeMap::new();
        unread.insert(me.clone(), 0);
        unread.insert(other.clone(), 0);

        let conversation = Conversation {
            id: next_conversation_id(),
            participants: [me.clone(), other.clone()],
            listing_id: seed.listing_id,
            listing_title: seed.listing_title,
            listing_image: seed.listing_image,
            last_message: String::new(),
            last_message_time: now,
            unread,
            created_at: now,
        };

        let stored = self.repository.insert_conversation(conversation).await?;
        Ok(stored)
    }

    /// Appends an immutable message, then updates the parent
    /// conversation's preview and increments only the receiver's unread
    /// counter.
    ///
    /// The two writes are not atomic. If the second fails the appended
    /// message is already visible in the thread while the preview is
    /// stale; `rebuild_preview` recovers from exactly that state.
    pub async fn send(
        &self,
        conversation_id: &ConversationId,
        sender: &UserId,
        text: &str,
    ) -> Result<Message, MessagingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MessagingError::EmptyMessage);
        }

        let mut conversation = self
            .repository
            .fetch_conversation(conversation_id)
            .await?
            .ok_or(MessagingError::ConversationNotFound)?;
        let receiver = conversation
            .counterpart(sender)
            .ok_or(MessagingError::NotParticipant)?
            .clone();

        let message = Message {
            id: next_message_id(),
            conversation_id: conversation_id.clone(),
            sender_id: sender.clone(),
            receiver_id: receiver.clone(),
            text: text.to_string(),
            timestamp: Utc::now(),
            read: false,
        };

        let stored = self.repository.append_message(message).await?;

        conversation.last_message = stored.text.clone();
        conversation.last_message_time = stored.timestamp;
        *conversation.unread.entry(receiver).or_insert(0) += 1;

        if let Err(error) = self.repository.update_conversation(conversation).await {
            warn!(
                conversation = %conversation_id,
                %error,
                "message stored but conversation preview update failed"
            );
            return Err(error.into());
        }

        Ok(stored)
    }

    /// Resets the reading user's unread counter to zero. Individual
    /// message read flags are untouched; flip those per-message with
    /// `mark_message_read`.
    pub async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<(), MessagingError> {
        let mut conversation = self
            .repository
            .fetch_conversation(conversation_id)
            .await?
            .ok_or(MessagingError::ConversationNotFound)?;
        if !conversation.involves(user) {
            return Err(MessagingError::NotParticipant);
        }

        conversation.unread.insert(user.clone(), 0);
        self.repository.update_conversation(conversation).await?;
        Ok(())
    }

    pub async fn mark_message_read(&self, message: &MessageId) -> Result<(), MessagingError> {
        self.repository.set_message_read(message).await?;
        Ok(())
    }

    /// Recomputes the denormalized preview and both unread counters from
    /// the message log. This is the documented recovery path for the
    /// non-atomic append/update pair, not a transactional guarantee.
    pub async fn rebuild_preview(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Conversation, MessagingError> {
        let mut conversation = self
            .repository
            .fetch_conversation(conversation_id)
            .await?
            .ok_or(MessagingError::ConversationNotFound)?;
        let messages = self.repository.messages(conversation_id).await?;

        match messages.last() {
            Some(last) => {
                conversation.last_message = last.text.clone();
                conversation.last_message_time = last.timestamp;
            }
            None => {
                conversation.last_message = String::new();
                conversation.last_message_time = conversation.created_at;
            }
        }

        for participant in conversation.participants.clone() {
            let unread = messages
                .iter()
                .filter(|message| message.receiver_id == participant && !message.read)
                .count() as u32;
            conversation.unread.insert(participant, unread);
        }

        self.repository
            .update_conversation(conversation.clone())
            .await?;
        Ok(conversation)
    }

    pub async fn conversations_for(
        &self,
        user: &UserId,
    ) -> Result<Vec<Conversation>, MessagingError> {
        Ok(self.repository.conversations_for(user).await?)
    }

    pub async fn messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, MessagingError> {
        Ok(self.repository.messages(conversation_id).await?)
    }

    /// Live feed of a conversation's messages; drop the handle when the
    /// thread leaves the screen.
    pub async fn watch_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Snapshots<Vec<Message>>, MessagingError> {
        Ok(self.repository.watch_messages(conversation_id).await?)
    }
}
