//! Shared failure surface for the document-store backed repositories.
//!
//! The application never talks to the backing store directly; each module
//! defines a repository trait and every implementation maps its transport
//! errors into this enum. Remote failures are reported once at the call
//! site and are never fatal to the process.

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected the request: {0}")]
    Rejected(String),
}
