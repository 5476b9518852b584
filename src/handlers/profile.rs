use axum::{extract::State, response::Response, Json};

use crate::auth::CurrentUser;
use crate::models::ProfileUpdate;
use crate::services::{events, profiles, rsvps};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn get(State(state): State<AppState>, current: CurrentUser) -> Result<Response, AppError> {
    let profile = profiles::get_profile(&state, &current.user).await?;
    Ok(success(profile, "Profile retrieved"))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, AppError> {
    let profile = profiles::update_profile(&state, &current.user, update).await?;
    Ok(success(profile, "Profile updated"))
}

pub async fn my_rsvps(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let history = rsvps::user_rsvps(&state, &current.user).await?;
    Ok(success(history, "RSVPs retrieved"))
}

pub async fn my_events(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let events = events::organizer_events(&state, &current.user).await?;
    Ok(success(events, "Events retrieved"))
}
