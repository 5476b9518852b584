use serde::Serialize;
use uuid::Uuid;

use super::{caller_profile, events};
use crate::auth::AuthUser;
use crate::models::{EventDetail, EventStatus};
use crate::state::AppState;
use crate::utils::error::AppError;

const DASHBOARD_LIST_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_events: i64,
    pub total_users: i64,
    pub pending_events: i64,
    pub total_rsvps: i64,
}

/// Dashboard reads are open to organizers and admins.
async fn require_staff(state: &AppState, user: &AuthUser) -> Result<(), AppError> {
    let allowed = caller_profile(state, user)
        .await?
        .is_some_and(|p| p.can_organize());
    if !allowed {
        return Err(AppError::Forbidden(
            "You do not have access to the admin dashboard".to_string(),
        ));
    }
    Ok(())
}

pub async fn dashboard_stats(state: &AppState, user: &AuthUser) -> Result<DashboardStats, AppError> {
    require_staff(state, user).await?;

    Ok(DashboardStats {
        total_events: state.store.count_events(None).await?,
        total_users: state.store.count_profiles().await?,
        pending_events: state.store.count_events(Some(EventStatus::Pending)).await?,
        total_rsvps: state.store.count_rsvps().await?,
    })
}

/// The newest events still waiting for approval.
pub async fn pending_events(state: &AppState, user: &AuthUser) -> Result<Vec<EventDetail>, AppError> {
    require_staff(state, user).await?;
    let pending = state
        .store
        .latest_events_with_status(EventStatus::Pending, DASHBOARD_LIST_LIMIT)
        .await?;
    events::with_details(state.store.as_ref(), pending).await
}

pub async fn recent_events(state: &AppState, user: &AuthUser) -> Result<Vec<EventDetail>, AppError> {
    require_staff(state, user).await?;
    let recent = state
        .store
        .recently_updated_events(DASHBOARD_LIST_LIMIT)
        .await?;
    events::with_details(state.store.as_ref(), recent).await
}

pub async fn publish(state: &AppState, user: &AuthUser, event_id: Uuid) -> Result<EventDetail, AppError> {
    let event = events::publish_event(state, Some(user), event_id).await?;
    events::with_details(state.store.as_ref(), vec![event])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}
