//! Conversation and message relay between listing owners and interested
//! users.
//!
//! A conversation is created lazily on first contact and keyed by the
//! unordered participant pair plus the listing. The preview fields and
//! unread counters on the conversation are denormalized from its message
//! log; the append/update pair is deliberately non-atomic and
//! `rebuild_preview` is the recovery path.

pub mod repository;
pub mod router;
pub mod service;

pub use repository::MessagingRepository;
pub use router::messaging_router;
pub use service::{ConversationSeed, MessagingError, MessagingService};
