use async_trait::async_trait;

use crate::domain::{Conversation, ConversationId, ListingId, Message, MessageId, UserId};
use crate::live::Snapshots;
use crate::store::StoreError;

/// Storage abstraction over the `conversations` and `messages`
/// collections.
#[async_trait]
pub trait MessagingRepository: Send + Sync {
    async fn insert_conversation(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, StoreError>;
    async fn update_conversation(&self, conversation: Conversation) -> Result<(), StoreError>;
    async fn fetch_conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, StoreError>;
    /// Conversations a user participates in, most recent message first.
    async fn conversations_for(&self, user: &UserId) -> Result<Vec<Conversation>, StoreError>;
    /// The conversation for an unordered participant pair scoped to one
    /// listing, if it exists.
    async fn conversation_for_pair(
        &self,
        a: &UserId,
        b: &UserId,
        listing: &ListingId,
    ) -> Result<Option<Conversation>, StoreError>;
    async fn append_message(&self, message: Message) -> Result<Message, StoreError>;
    /// Messages of one conversation, oldest first.
    async fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>, StoreError>;
    async fn set_message_read(&self, id: &MessageId) -> Result<(), StoreError>;
    /// Live full-snapshot feed of a conversation's messages, released when
    /// the handle is dropped.
    async fn watch_messages(
        &self,
        conversation: &ConversationId,
    ) -> Result<Snapshots<Vec<Message>>, StoreError>;
}
