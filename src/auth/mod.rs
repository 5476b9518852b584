//! Delegated authentication.
//!
//! Credentials never touch this service's database: sign-up, sign-in and
//! token validation go to a hosted auth provider through [`AuthProvider`].
//! Profiles (display fields and organizer/admin flags) live in our own
//! store and are keyed by the provider's user id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[cfg(feature = "test-utils")]
pub mod memory;
pub mod session;
pub mod supabase;

#[cfg(feature = "test-utils")]
pub use memory::InMemoryAuthProvider;
pub use session::{access_token, CurrentUser, MaybeUser, ACCESS_TOKEN_COOKIE};
pub use supabase::SupabaseAuthProvider;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider answered with an error; `message` is its own text.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("auth provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected auth provider response: {0}")]
    UnexpectedResponse(String),

    #[error("auth provider is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Facebook,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Facebook => "facebook",
        }
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(OAuthProvider::Google),
            "facebook" => Ok(OAuthProvider::Facebook),
            other => Err(format!("Unsupported OAuth provider: {other}")),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        redirect_to: &str,
    ) -> Result<AuthUser, AuthError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthError>;

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), AuthError>;

    /// Resolves a token to its user; `None` when the token is unknown or expired.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError>;

    fn oauth_authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, AuthError>;
}
