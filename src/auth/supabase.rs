use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{AuthError, AuthProvider, AuthSession, AuthUser, OAuthProvider};

/// Client for a Supabase (GoTrue) auth endpoint.
#[derive(Clone)]
pub struct SupabaseAuthProvider {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            full_name: user
                .user_metadata
                .get("full_name")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[derive(Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: i64,
    user: GoTrueUser,
}

/// Sign-up answers with a session when confirmation is off, else a bare user.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: GoTrueUser },
    User(GoTrueUser),
}

#[derive(Default, Deserialize)]
struct GoTrueErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

impl SupabaseAuthProvider {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        if self.base_url.is_empty() || self.anon_key.is_empty() {
            return Err(AuthError::NotConfigured);
        }
        Url::parse(&format!("{}/auth/v1/{path}", self.base_url))
            .map_err(|e| AuthError::UnexpectedResponse(format!("invalid auth URL: {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
    }
}

/// Turns a non-2xx response into the provider's own error message.
async fn check(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: GoTrueErrorBody = response.json().await.unwrap_or_default();
    let message = body.into_message().unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Authentication failed")
            .to_string()
    });

    tracing::debug!(status = status.as_u16(), message = %message, "Auth provider rejected request");

    Err(AuthError::Provider {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        redirect_to: &str,
    ) -> Result<AuthUser, AuthError> {
        let mut url = self.endpoint("signup")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;

        let user = match check(response).await?.json::<SignUpResponse>().await? {
            SignUpResponse::Session { user } | SignUpResponse::User(user) => user,
        };

        Ok(user.into())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session: GoTrueSession = check(response).await?.json().await?;

        Ok(AuthSession {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            user: session.user.into(),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("logout")?;
        let response = self
            .request(reqwest::Method::POST, url)
            .bearer_auth(access_token)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthError> {
        let mut url = self.endpoint("recover")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({ "email": email }))
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), AuthError> {
        let url = self.endpoint("user")?;
        let response = self
            .request(reqwest::Method::PUT, url)
            .bearer_auth(access_token)
            .json(&json!({ "password": password }))
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let url = self.endpoint("user")?;
        let response = self
            .request(reqwest::Method::GET, url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let user: GoTrueUser = check(response).await?.json().await?;
        Ok(Some(user.into()))
    }

    fn oauth_authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, AuthError> {
        let mut url = self.endpoint("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to);
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_provider_refuses_requests() {
        let provider = SupabaseAuthProvider::new("", "");
        assert!(matches!(
            provider.oauth_authorize_url(OAuthProvider::Google, "http://localhost:3000/auth/callback"),
            Err(AuthError::NotConfigured)
        ));
    }

    #[test]
    fn test_oauth_url_carries_provider_and_redirect() {
        let provider = SupabaseAuthProvider::new("https://abc.supabase.co/", "anon");
        let url = provider
            .oauth_authorize_url(OAuthProvider::Facebook, "https://streetpulse.example/auth/callback")
            .unwrap();

        assert_eq!(
            url,
            "https://abc.supabase.co/auth/v1/authorize?provider=facebook\
             &redirect_to=https%3A%2F%2Fstreetpulse.example%2Fauth%2Fcallback"
        );
    }

    #[test]
    fn test_sign_up_response_shapes() {
        let bare: SignUpResponse = serde_json::from_value(json!({
            "id": "5f0c6a34-8d6b-4bd3-9a0e-9d5c3f2f1c11",
            "email": "kai@example.com",
            "user_metadata": { "full_name": "Kai Moreno" }
        }))
        .unwrap();
        assert!(matches!(bare, SignUpResponse::User(_)));

        let with_session: SignUpResponse = serde_json::from_value(json!({
            "access_token": "token",
            "user": {
                "id": "5f0c6a34-8d6b-4bd3-9a0e-9d5c3f2f1c11",
                "email": "kai@example.com"
            }
        }))
        .unwrap();
        let SignUpResponse::Session { user } = with_session else {
            panic!("expected session shape");
        };
        let user: AuthUser = user.into();
        assert_eq!(user.email, "kai@example.com");
        assert_eq!(user.full_name, None);
    }

    #[test]
    fn test_error_message_precedence() {
        let body: GoTrueErrorBody = serde_json::from_value(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        }))
        .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));
    }
}
