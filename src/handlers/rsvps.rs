use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::MaybeUser;
use crate::models::{RsvpRequest, RsvpStatus};
use crate::services::rsvps;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
struct RsvpState {
    status: Option<RsvpStatus>,
}

pub async fn status(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let status = rsvps::get_user_rsvp_status(&state, caller.user(), event_id).await?;
    Ok(success(RsvpState { status }, "RSVP status retrieved"))
}

pub async fn respond(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(event_id): Path<Uuid>,
    Json(request): Json<RsvpRequest>,
) -> Result<Response, AppError> {
    let rsvp = rsvps::rsvp_to_event(&state, caller.user(), event_id, request.status).await?;
    Ok(success(rsvp, "RSVP saved"))
}

pub async fn list(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let listing = rsvps::get_event_rsvps(&state, event_id).await?;
    Ok(success(listing, "RSVPs retrieved"))
}
