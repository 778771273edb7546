//! Listing lifecycle: publish, edit, status changes, and browsing.
//!
//! The store only evaluates coarse equality predicates; browsing layers
//! the client-side search pipeline on top of whatever the coarse query
//! returns.

pub mod repository;
pub mod router;
pub mod service;

pub use repository::{ListingQuery, ListingRepository};
pub use router::listing_router;
pub use service::{
    ListingChanges, ListingDraft, ListingError, ListingService, ListingValidationError,
};
