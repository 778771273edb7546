//! Per-user favorite set with optimistic local state.

pub mod repository;
pub mod service;

pub use repository::FavoriteRepository;
pub use service::{FavoriteToggle, FavoritesService};
