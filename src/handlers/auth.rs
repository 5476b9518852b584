use axum::{
    extract::{Path, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentUser, OAuthProvider, ACCESS_TOKEN_COOKIE};
use crate::services::auth as auth_service;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
struct OAuthRedirect {
    url: String,
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{ACCESS_TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Response, AppError> {
    let user =
        auth_service::sign_up(&state, &payload.email, &payload.password, &payload.full_name).await?;

    Ok(created(user, "Check your email to confirm your account"))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Response, AppError> {
    let session = auth_service::sign_in(&state, &payload.email, &payload.password).await?;
    let cookie = session_cookie(&session.access_token, session.expires_in);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        success(session, "Signed in"),
    )
        .into_response())
}

pub async fn sign_out(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    auth_service::sign_out(&state, &current.access_token).await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie("", 0))]),
        empty_success("Signed out"),
    )
        .into_response())
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response, AppError> {
    auth_service::reset_password(&state, &payload.email).await?;
    Ok(empty_success("Check your email for a password reset link"))
}

pub async fn update_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Response, AppError> {
    auth_service::update_password(
        &state,
        &current.access_token,
        &payload.password,
        &payload.confirm_password,
    )
    .await?;
    Ok(empty_success("Password updated"))
}

pub async fn oauth(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Response, AppError> {
    let provider: OAuthProvider = provider.parse().map_err(AppError::ValidationError)?;
    let url = auth_service::oauth_url(&state, provider)?;
    Ok(success(OAuthRedirect { url }, "Redirect to provider"))
}

pub async fn me(State(state): State<AppState>, current: CurrentUser) -> Result<Response, AppError> {
    let me = auth_service::current_user(&state, &current.user).await?;
    Ok(success(me, "Current user"))
}
