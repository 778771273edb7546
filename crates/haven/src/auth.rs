//! Contract toward the external authentication provider.
//!
//! Sessions, credentials, and password storage live entirely in the
//! provider; the application observes the current session through a
//! watch stream and performs pass-through calls. Registration input is
//! validated locally before any remote call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::domain::UserId;

/// The authenticated identity as the provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Profile fields a signed-in user may change; absent fields keep their
/// value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

/// The few provider error identifiers the app distinguishes (so
/// password-reset flows can tell a wrong credential from a missing
/// account); everything else is the generic backend case.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("wrong email or password")]
    WrongCredential,
    #[error("no account exists for this email")]
    NoSuchAccount,
    #[error("email address is malformed")]
    InvalidEmail,
    #[error("an account already exists for this email")]
    EmailInUse,
    #[error("password must be at least {minimum} characters")]
    WeakPassword { minimum: usize },
    #[error("password confirmation does not match")]
    PasswordMismatch,
    #[error("display name is required")]
    MissingDisplayName,
    #[error("authentication backend error: {0}")]
    Backend(String),
}

pub const PASSWORD_MINIMUM: usize = 6;

/// Pre-flight checks for the registration form; failures never reach the
/// provider.
pub fn validate_registration(
    email: &str,
    display_name: &str,
    password: &str,
    confirmation: &str,
) -> Result<(), AuthError> {
    if display_name.trim().is_empty() {
        return Err(AuthError::MissingDisplayName);
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AuthError::InvalidEmail);
    }
    if password.len() < PASSWORD_MINIMUM {
        return Err(AuthError::WeakPassword {
            minimum: PASSWORD_MINIMUM,
        });
    }
    if password != confirmation {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

/// Abstract auth-provider contract. `sessions` yields the current user
/// (or none) on every auth-state transition.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    async fn reset_password(&self, email: &str) -> Result<(), AuthError>;
    async fn update_profile(&self, updates: ProfileUpdate) -> Result<AuthUser, AuthError>;
    fn sessions(&self) -> watch::Receiver<Option<AuthUser>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_requires_matching_confirmation() {
        let result = validate_registration("nadia@example.com", "Nadia", "secret1", "secret2");
        assert!(matches!(result, Err(AuthError::PasswordMismatch)));
    }

    #[test]
    fn registration_rejects_malformed_email() {
        assert!(matches!(
            validate_registration("not-an-email", "Nadia", "secret1", "secret1"),
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            validate_registration("@example.com", "Nadia", "secret1", "secret1"),
            Err(AuthError::InvalidEmail)
        ));
    }

    #[test]
    fn registration_enforces_password_minimum() {
        assert!(matches!(
            validate_registration("nadia@example.com", "Nadia", "short", "short"),
            Err(AuthError::WeakPassword { minimum: 6 })
        ));
    }

    #[test]
    fn registration_accepts_well_formed_input() {
        assert!(
            validate_registration("nadia@example.com", "Nadia", "secret1", "secret1").is_ok()
        );
    }
}
