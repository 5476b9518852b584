use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::auth::MaybeUser;
use crate::models::{EventInput, EventQuery};
use crate::services::{events, profiles};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    caller: MaybeUser,
    Query(query): Query<EventQuery>,
) -> Result<Response, AppError> {
    let list = events::list_events(&state, caller.user(), &query).await?;
    Ok(success(list, "Events retrieved"))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response, AppError> {
    let event = events::get_event(&state, id).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn similar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let similar = events::similar_events(&state, id).await?;
    Ok(success(similar, "Similar events retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    caller: MaybeUser,
    Json(input): Json<EventInput>,
) -> Result<Response, AppError> {
    let event = events::create_event(&state, caller.user(), input).await?;
    Ok(created(event, "Event submitted for review"))
}

pub async fn update(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(id): Path<Uuid>,
    Json(input): Json<EventInput>,
) -> Result<Response, AppError> {
    let event = events::update_event(&state, caller.user(), id, input).await?;
    Ok(success(event, "Event updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    events::delete_event(&state, caller.user(), id).await?;
    Ok(empty_success("Event deleted"))
}

pub async fn tags(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(profiles::tags(&state).await?, "Tags retrieved"))
}

pub async fn dance_styles(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(
        profiles::dance_styles(&state).await?,
        "Dance styles retrieved",
    ))
}
