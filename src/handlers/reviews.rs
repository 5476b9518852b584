use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::auth::MaybeUser;
use crate::models::ReviewInput;
use crate::services::reviews;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn list(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let summary = reviews::event_reviews(&state, event_id).await?;
    Ok(success(summary, "Reviews retrieved"))
}

pub async fn submit(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(event_id): Path<Uuid>,
    Json(input): Json<ReviewInput>,
) -> Result<Response, AppError> {
    let review = reviews::submit_review(&state, caller.user(), event_id, input).await?;
    Ok(success(review, "Thanks for your review"))
}
