use std::collections::HashMap;

use uuid::Uuid;

use super::require_user;
use crate::auth::AuthUser;
use crate::email::templates;
use crate::models::{
    Event, EventRsvps, ProfileSummary, Rsvp, RsvpCounts, RsvpStatus, RsvpWithUser, UserRsvp,
};
use crate::state::AppState;
use crate::utils::error::AppError;

pub(crate) const EMAIL_DATE_FORMAT: &str = "%A, %B %-d, %Y at %-I:%M %p";

/// Records the caller's status for an event, replacing any earlier answer.
pub async fn rsvp_to_event(
    state: &AppState,
    user: Option<&AuthUser>,
    event_id: Uuid,
    status: RsvpStatus,
) -> Result<Rsvp, AppError> {
    let user = require_user(user, "RSVP to an event")?;

    let event = state
        .store
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let rsvp = match state.store.find_rsvp(event_id, user.id).await? {
        Some(existing) => {
            state.store.update_rsvp_status(existing.id, status).await?;
            state
                .store
                .find_rsvp(event_id, user.id)
                .await?
                .ok_or_else(|| AppError::InternalServerError("RSVP vanished after update".to_string()))?
        }
        None => state.store.insert_rsvp(event_id, user.id, status).await?,
    };

    tracing::info!(%event_id, user_id = %user.id, status = ?status, "RSVP recorded");

    if status == RsvpStatus::Attending {
        send_confirmation(state, user, &event).await;
    }

    Ok(rsvp)
}

async fn send_confirmation(state: &AppState, user: &AuthUser, event: &Event) {
    let location = match event.location_id {
        Some(id) => state
            .store
            .get_locations(&[id])
            .await
            .ok()
            .and_then(|mut found| found.pop())
            .map(|l| l.label()),
        None => None,
    };

    let name = user.full_name.as_deref().unwrap_or("Dancer");
    let message = templates::rsvp_confirmation(
        &user.email,
        name,
        &event.title,
        &event.start_time.format(EMAIL_DATE_FORMAT).to_string(),
        location.as_deref().unwrap_or("TBA"),
    );

    if let Err(e) = state.mailer.send(&message).await {
        tracing::error!(event_id = %event.id, error = ?e, "Failed to send RSVP confirmation");
    }
}

/// The caller's current status; `None` for anonymous callers or no RSVP.
pub async fn get_user_rsvp_status(
    state: &AppState,
    user: Option<&AuthUser>,
    event_id: Uuid,
) -> Result<Option<RsvpStatus>, AppError> {
    let Some(user) = user else {
        return Ok(None);
    };
    Ok(state
        .store
        .find_rsvp(event_id, user.id)
        .await?
        .map(|r| r.status))
}

pub async fn get_event_rsvps(state: &AppState, event_id: Uuid) -> Result<EventRsvps, AppError> {
    let rsvps = state.store.rsvps_for_event(event_id).await?;
    let counts = RsvpCounts::tally(&rsvps);

    let user_ids: Vec<Uuid> = rsvps.iter().map(|r| r.user_id).collect();
    let users: HashMap<_, _> = state
        .store
        .get_profiles(&user_ids)
        .await?
        .iter()
        .map(|p| (p.id, ProfileSummary::from(p)))
        .collect();

    let rsvps = rsvps
        .into_iter()
        .map(|rsvp| RsvpWithUser {
            user: users.get(&rsvp.user_id).cloned(),
            rsvp,
        })
        .collect();

    Ok(EventRsvps { counts, rsvps })
}

/// The caller's RSVPs, newest first, with the events they point at.
pub async fn user_rsvps(state: &AppState, user: &AuthUser) -> Result<Vec<UserRsvp>, AppError> {
    let rsvps = state.store.rsvps_for_user(user.id).await?;

    let mut entries = Vec::with_capacity(rsvps.len());
    for rsvp in rsvps {
        let Some(event) = state.store.get_event(rsvp.event_id).await? else {
            continue;
        };
        entries.push((rsvp, event));
    }

    let location_ids: Vec<Uuid> = entries.iter().filter_map(|(_, e)| e.location_id).collect();
    let locations: HashMap<_, _> = state
        .store
        .get_locations(&location_ids)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();

    Ok(entries
        .into_iter()
        .map(|(rsvp, event)| UserRsvp {
            id: rsvp.id,
            status: rsvp.status,
            location: event.location_id.and_then(|id| locations.get(&id).cloned()),
            event,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventInput;
    use crate::services::testing::harness;
    use crate::store::Store;
    use chrono::{Duration, Utc};

    async fn event(store: &dyn Store, organizer: Uuid) -> Event {
        let start = Utc::now() + Duration::days(1);
        store
            .insert_event(
                organizer,
                &EventInput {
                    title: "Locking Jam".to_string(),
                    description: "Locking and popping session".to_string(),
                    location_id: None,
                    start_time: start,
                    end_time: start + Duration::hours(3),
                    price_range: None,
                    cover_image: None,
                    has_live_dj: false,
                    is_beginner_friendly: true,
                    has_open_floor: true,
                    age_restriction: None,
                    dress_code: None,
                    amenities: vec![],
                    dance_styles: vec![],
                    tags: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_repeat_rsvp_keeps_one_row_with_latest_status() {
        let h = harness();
        let dancer = h.user("dancer@example.com", false, false).await;
        let event = event(h.state.store.as_ref(), dancer.id).await;

        let first = rsvp_to_event(&h.state, Some(&dancer), event.id, RsvpStatus::Maybe)
            .await
            .unwrap();
        let second = rsvp_to_event(&h.state, Some(&dancer), event.id, RsvpStatus::NotAttending)
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.status, RsvpStatus::NotAttending);
        assert!(second.updated_at >= first.updated_at);
        let stored = h.store.find_rsvp(event.id, dancer.id).await.unwrap().unwrap();
        assert_eq!(second.updated_at, stored.updated_at);

        let listing = get_event_rsvps(&h.state, event.id).await.unwrap();
        assert_eq!(listing.counts.total, 1);
        assert_eq!(listing.counts.not_attending, 1);
        assert_eq!(
            get_user_rsvp_status(&h.state, Some(&dancer), event.id).await.unwrap(),
            Some(RsvpStatus::NotAttending)
        );
    }

    #[tokio::test]
    async fn test_attending_sends_confirmation() {
        let h = harness();
        let dancer = h.user("dancer@example.com", false, false).await;
        let event = event(h.state.store.as_ref(), dancer.id).await;

        rsvp_to_event(&h.state, Some(&dancer), event.id, RsvpStatus::Attending)
            .await
            .unwrap();

        let logs = h.store.email_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].subject, "RSVP Confirmation: Locking Jam");
    }

    #[tokio::test]
    async fn test_anonymous_rsvp_rejected_and_status_empty() {
        let h = harness();
        let event_id = Uuid::new_v4();

        let err = rsvp_to_event(&h.state, None, event_id, RsvpStatus::Attending)
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "You must be logged in to RSVP to an event");
        assert_eq!(get_user_rsvp_status(&h.state, None, event_id).await.unwrap(), None);
    }
}
