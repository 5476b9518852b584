use axum::{
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::services::{admin, digest};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn stats(State(state): State<AppState>, current: CurrentUser) -> Result<Response, AppError> {
    let stats = admin::dashboard_stats(&state, &current.user).await?;
    Ok(success(stats, "Dashboard stats retrieved"))
}

pub async fn pending(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let events = admin::pending_events(&state, &current.user).await?;
    Ok(success(events, "Pending events retrieved"))
}

pub async fn recent(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let events = admin::recent_events(&state, &current.user).await?;
    Ok(success(events, "Recent events retrieved"))
}

pub async fn publish(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = admin::publish(&state, &current.user, id).await?;
    Ok(success(event, "Event published"))
}

pub async fn send_digest(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let report = digest::send_weekly_digest(&state, &current.user).await?;
    Ok(success(report, "Weekly digest sent"))
}
