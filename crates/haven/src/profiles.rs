//! User profile documents in the external store.
//!
//! The auth provider owns identity; the `users` collection carries the
//! richer profile (phone, bio). A profile edit is a two-step write: the
//! document first, then the provider's own display-name/photo fields,
//! mirroring how the rest of the app denormalizes across collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::auth::{AuthError, AuthProvider, AuthUser, ProfileUpdate};
use crate::domain::{UserId, UserProfile};
use crate::store::StoreError;

/// Storage abstraction over the `users` collection.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn upsert(&self, profile: UserProfile) -> Result<(), StoreError>;
    async fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Creates and edits the stored profile, keeping the auth provider's
/// display fields in step.
pub struct ProfileService<R, A> {
    repository: Arc<R>,
    auth: Arc<A>,
}

impl<R, A> ProfileService<R, A>
where
    R: ProfileRepository + 'static,
    A: AuthProvider + 'static,
{
    pub fn new(repository: Arc<R>, auth: Arc<A>) -> Self {
        Self { repository, auth }
    }

    /// Seeds the profile document for a freshly registered account.
    pub async fn register(&self, account: &AuthUser) -> Result<UserProfile, ProfileError> {
        let profile = UserProfile {
            id: account.id.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            photo_url: account.photo_url.clone(),
            phone_number: None,
            bio: None,
            created_at: Utc::now(),
        };
        self.repository.upsert(profile.clone()).await?;
        Ok(profile)
    }

    pub async fn get(&self, id: &UserId) -> Result<Option<UserProfile>, ProfileError> {
        Ok(self.repository.fetch(id).await?)
    }

    /// Applies the edit to the stored document, then echoes display name
    /// and photo to the auth provider. The second step only runs when one
    /// of those fields changed.
    pub async fn update(
        &self,
        id: &UserId,
        updates: ProfileUpdate,
    ) -> Result<UserProfile, ProfileError> {
        let mut profile = self
            .repository
            .fetch(id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let touches_auth = updates.display_name.is_some() || updates.photo_url.is_some();

        if let Some(display_name) = &updates.display_name {
            profile.display_name = display_name.clone();
        }
        if let Some(photo_url) = &updates.photo_url {
            profile.photo_url = Some(photo_url.clone());
        }
        if let Some(phone_number) = &updates.phone_number {
            profile.phone_number = Some(phone_number.clone());
        }
        if let Some(bio) = &updates.bio {
            profile.bio = Some(bio.clone());
        }

        self.repository.upsert(profile.clone()).await?;

        if touches_auth {
            self.auth.update_profile(updates).await?;
        }

        Ok(profile)
    }
}
