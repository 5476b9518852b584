//! Request-scoped identity.
//!
//! The access token is read from `Authorization: Bearer <token>` or, for
//! browser requests, the `sp-access-token` cookie. Resolution always goes to
//! the auth provider; nothing is cached across requests.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use super::AuthUser;
use crate::state::AppState;
use crate::utils::error::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "sp-access-token";

pub fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// The signed-in caller. Rejects with 401 when there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub access_token: String,
}

impl CurrentUser {
    pub async fn resolve(headers: &HeaderMap, state: &AppState) -> Result<Option<Self>, AppError> {
        let Some(token) = access_token(headers) else {
            return Ok(None);
        };

        let user = state.auth.get_user(&token).await?;
        Ok(user.map(|user| Self {
            user,
            access_token: token,
        }))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.ok_or_else(|| AppError::AuthError("You must be logged in".to_string()))
    }
}

/// The caller if signed in. Only provider failures reject.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref().map(|current| &current.user)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // The access gate already resolved the session for protected paths.
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(Self(Some(current.clone())));
        }

        let current = CurrentUser::resolve(&parts.headers, state).await?;
        if let Some(current) = &current {
            parts.extensions.insert(current.clone());
        }
        Ok(Self(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("sp-access-token=from-cookie"),
        );
        assert_eq!(access_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_token_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sp-access-token=tok-9; lang=en"),
        );
        assert_eq!(access_token(&headers).as_deref(), Some("tok-9"));
    }

    #[test]
    fn test_missing_or_blank_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(access_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("sp-access-token="));
        assert_eq!(access_token(&headers), None);
    }
}
