//! Per-user in-app notification feed.

pub mod repository;
pub mod service;

pub use repository::NotificationRepository;
pub use service::{NotificationService, RECENT_LIMIT};
