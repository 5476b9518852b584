use serde::Serialize;

use crate::auth::{AuthSession, AuthUser, OAuthProvider};
use crate::email::templates;
use crate::models::{NewProfile, Profile};
use crate::state::AppState;
use crate::utils::error::AppError;

/// The caller's identity plus their profile row, if one exists.
#[derive(Debug, Clone, Serialize)]
pub struct Me {
    pub user: AuthUser,
    pub profile: Option<Profile>,
}

pub async fn sign_up(
    state: &AppState,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<AuthUser, AppError> {
    let email = email.trim();
    let full_name = full_name.trim();

    if email.is_empty() || !email.contains('@') {
        return Err(AppError::ValidationError("A valid email is required".to_string()));
    }

    if state.store.find_profile_by_email(email).await?.is_some() {
        return Err(AppError::ValidationError("Email already in use".to_string()));
    }

    let user = state
        .auth
        .sign_up(email, password, full_name, &state.config.auth_callback_url())
        .await?;

    let profile = state
        .store
        .insert_profile(&NewProfile {
            id: user.id,
            email: user.email.clone(),
            full_name: Some(full_name.to_string()).filter(|n| !n.is_empty()),
        })
        .await?;
    tracing::info!(user_id = %user.id, "User signed up");

    let message = templates::welcome(&profile.email, profile.display_name(), &state.config.site_url);
    if let Err(e) = state.mailer.send(&message).await {
        tracing::error!(user_id = %user.id, error = ?e, "Failed to send welcome email");
    }

    Ok(user)
}

pub async fn sign_in(state: &AppState, email: &str, password: &str) -> Result<AuthSession, AppError> {
    let session = state.auth.sign_in_with_password(email.trim(), password).await?;
    tracing::info!(user_id = %session.user.id, "User signed in");
    Ok(session)
}

pub async fn sign_out(state: &AppState, access_token: &str) -> Result<(), AppError> {
    state.auth.sign_out(access_token).await?;
    Ok(())
}

pub async fn reset_password(state: &AppState, email: &str) -> Result<(), AppError> {
    state
        .auth
        .reset_password_for_email(email.trim(), &state.config.password_reset_url())
        .await?;
    Ok(())
}

pub async fn update_password(
    state: &AppState,
    access_token: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), AppError> {
    if password != confirm_password {
        return Err(AppError::ValidationError("Passwords do not match".to_string()));
    }
    state.auth.update_password(access_token, password).await?;
    Ok(())
}

pub fn oauth_url(state: &AppState, provider: OAuthProvider) -> Result<String, AppError> {
    Ok(state
        .auth
        .oauth_authorize_url(provider, &state.config.auth_callback_url())?)
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> Result<Me, AppError> {
    let profile = state.store.get_profile(user.id).await?;
    Ok(Me {
        user: user.clone(),
        profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::harness;

    #[tokio::test]
    async fn test_sign_up_creates_profile_and_welcome_log() {
        let h = harness();

        let user = sign_up(&h.state, "kai@example.com", "secret123", "Kai Moreno")
            .await
            .unwrap();

        let me = current_user(&h.state, &user).await.unwrap();
        let profile = me.profile.unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Kai Moreno"));
        assert!(!profile.is_organizer);

        let logs = h.store.email_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].subject, "Welcome to Street Pulse!");
    }

    #[tokio::test]
    async fn test_sign_up_with_taken_email() {
        let h = harness();
        h.user("kai@example.com", false, false).await;

        let err = sign_up(&h.state, "kai@example.com", "secret123", "Kai")
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Email already in use");
    }

    #[tokio::test]
    async fn test_bad_credentials_surface_provider_message() {
        let h = harness();
        h.user("kai@example.com", false, false).await;

        let err = sign_in(&h.state, "kai@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_reset_goes_to_provider() {
        let h = harness();
        reset_password(&h.state, " kai@example.com ").await.unwrap();
        assert_eq!(h.auth.password_resets(), vec!["kai@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_password_mismatch() {
        let h = harness();
        let err = update_password(&h.state, "token", "abcdef", "abcdeg")
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Passwords do not match");
    }
}
