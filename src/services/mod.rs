//! Business operations.
//!
//! Handlers stay thin: they extract the caller and the payload, then call
//! into these functions, which compose store primitives, the auth provider
//! and the mailer. Authorization always re-reads the caller's profile.

use crate::auth::AuthUser;
use crate::models::Profile;
use crate::state::AppState;
use crate::utils::error::AppError;

pub mod admin;
pub mod auth;
pub mod digest;
pub mod events;
pub mod profiles;
pub mod reviews;
pub mod rsvps;
pub mod tags;

/// The signed-in caller, or "You must be logged in to {action}".
pub(crate) fn require_user<'a>(
    user: Option<&'a AuthUser>,
    action: &str,
) -> Result<&'a AuthUser, AppError> {
    user.ok_or_else(|| AppError::AuthError(format!("You must be logged in to {action}")))
}

pub(crate) async fn caller_profile(
    state: &AppState,
    user: &AuthUser,
) -> Result<Option<Profile>, AppError> {
    Ok(state.store.get_profile(user.id).await?)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::auth::{AuthProvider, AuthUser, InMemoryAuthProvider};
    use crate::config::Config;
    use crate::email::LogMailer;
    use crate::models::NewProfile;
    use crate::state::AppState;
    use crate::store::{InMemoryStore, Store};

    pub struct Harness {
        pub state: AppState,
        pub store: InMemoryStore,
        pub auth: InMemoryAuthProvider,
    }

    pub fn config() -> Config {
        Config {
            database_url: String::new(),
            database_max_connections: 1,
            port: 0,
            site_url: "http://localhost:3000".to_string(),
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
        }
    }

    pub fn harness() -> Harness {
        let store = InMemoryStore::new();
        let auth = InMemoryAuthProvider::new();
        let shared: Arc<dyn Store> = Arc::new(store.clone());
        let state = AppState::new(
            config(),
            shared.clone(),
            Arc::new(auth.clone()),
            Arc::new(LogMailer::new(shared)),
        );
        Harness { state, store, auth }
    }

    impl Harness {
        /// Registers a user with the auth provider and gives them a profile.
        pub async fn user(&self, email: &str, organizer: bool, admin: bool) -> AuthUser {
            let user = self
                .auth
                .sign_up(email, "password123", "Test Dancer", "")
                .await
                .unwrap();
            self.store
                .insert_profile(&NewProfile {
                    id: user.id,
                    email: user.email.clone(),
                    full_name: user.full_name.clone(),
                })
                .await
                .unwrap();
            self.store.set_roles(user.id, organizer, admin).unwrap();
            user
        }
    }
}
