//! In-memory auth provider for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{AuthError, AuthProvider, AuthSession, AuthUser, OAuthProvider};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Default)]
struct Accounts {
    by_email: HashMap<String, (AuthUser, String)>,
    tokens: HashMap<String, Uuid>,
    password_resets: Vec<String>,
}

#[derive(Clone, Default)]
pub struct InMemoryAuthProvider {
    accounts: Arc<Mutex<Accounts>>,
}

fn rejected(status: u16, message: &str) -> AuthError {
    AuthError::Provider {
        status,
        message: message.to_string(),
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self) -> Result<MutexGuard<'_, Accounts>, AuthError> {
        self.accounts
            .lock()
            .map_err(|_| AuthError::UnexpectedResponse("auth state poisoned".to_string()))
    }

    /// Emails that asked for a password reset, oldest first.
    pub fn password_resets(&self) -> Vec<String> {
        self.accounts()
            .map(|a| a.password_resets.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        _redirect_to: &str,
    ) -> Result<AuthUser, AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(rejected(422, "Password should be at least 6 characters"));
        }

        let mut accounts = self.accounts()?;
        if accounts.by_email.contains_key(email) {
            return Err(rejected(422, "User already registered"));
        }

        let user = AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: Some(full_name.to_string()),
        };
        accounts
            .by_email
            .insert(email.to_string(), (user.clone(), password.to_string()));
        Ok(user)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let mut accounts = self.accounts()?;
        let user = match accounts.by_email.get(email) {
            Some((user, stored)) if stored == password => user.clone(),
            _ => return Err(rejected(400, "Invalid login credentials")),
        };

        let access_token = Uuid::new_v4().to_string();
        accounts.tokens.insert(access_token.clone(), user.id);

        Ok(AuthSession {
            access_token,
            refresh_token: Uuid::new_v4().to_string(),
            expires_in: 3600,
            user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.accounts()?.tokens.remove(access_token);
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        _redirect_to: &str,
    ) -> Result<(), AuthError> {
        self.accounts()?.password_resets.push(email.to_string());
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), AuthError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(rejected(422, "Password should be at least 6 characters"));
        }

        let mut accounts = self.accounts()?;
        let user_id = *accounts
            .tokens
            .get(access_token)
            .ok_or_else(|| rejected(401, "Invalid token"))?;

        if let Some((_, stored)) = accounts
            .by_email
            .values_mut()
            .find(|(user, _)| user.id == user_id)
        {
            *stored = password.to_string();
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let accounts = self.accounts()?;
        let Some(user_id) = accounts.tokens.get(access_token) else {
            return Ok(None);
        };
        Ok(accounts
            .by_email
            .values()
            .find(|(user, _)| user.id == *user_id)
            .map(|(user, _)| user.clone()))
    }

    fn oauth_authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, AuthError> {
        let query = serde_urlencoded::to_string([
            ("provider", provider.as_str()),
            ("redirect_to", redirect_to),
        ])
        .map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
        Ok(format!("http://auth.test/authorize?{query}"))
    }
}
