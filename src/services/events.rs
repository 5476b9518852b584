use std::collections::HashMap;

use uuid::Uuid;

use super::{caller_profile, require_user, tags};
use crate::auth::AuthUser;
use crate::models::{
    Event, EventDetail, EventFilter, EventInput, EventList, EventQuery, EventStatus,
    ProfileSummary,
};
use crate::state::AppState;
use crate::store::Store;
use crate::utils::error::AppError;

const SIMILAR_EVENTS_LIMIT: i64 = 2;

fn not_found() -> AppError {
    AppError::NotFound("Event not found".to_string())
}

/// Attaches location, organizer, tag names and attendee count to each event,
/// one batched store call per relation.
pub async fn with_details(store: &dyn Store, events: Vec<Event>) -> Result<Vec<EventDetail>, AppError> {
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    let location_ids: Vec<Uuid> = events.iter().filter_map(|e| e.location_id).collect();
    let organizer_ids: Vec<Uuid> = events.iter().map(|e| e.organizer_id).collect();

    let locations: HashMap<_, _> = store
        .get_locations(&location_ids)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();
    let organizers: HashMap<_, _> = store
        .get_profiles(&organizer_ids)
        .await?
        .iter()
        .map(|p| (p.id, ProfileSummary::from(p)))
        .collect();
    let attendees: HashMap<_, _> = store.attending_counts(&event_ids).await?.into_iter().collect();

    let mut tag_names: HashMap<Uuid, Vec<String>> = HashMap::new();
    for link in store.tags_for_events(&event_ids).await? {
        tag_names.entry(link.event_id).or_default().push(link.name);
    }

    Ok(events
        .into_iter()
        .map(|event| EventDetail {
            location: event.location_id.and_then(|id| locations.get(&id).cloned()),
            organizer: organizers.get(&event.organizer_id).cloned(),
            tags: tag_names.remove(&event.id).unwrap_or_default(),
            attendees: attendees.get(&event.id).copied().unwrap_or(0),
            event,
        })
        .collect())
}

/// Which statuses the caller may list, and whose events.
///
/// Anyone sees published events. Admins may list any status; organizers may
/// list other statuses for their own events only. Everyone else gets the
/// published listing whatever they asked for.
async fn visible_scope(
    state: &AppState,
    user: Option<&AuthUser>,
    query: &EventQuery,
) -> Result<(EventStatus, Option<Uuid>), AppError> {
    let requested = query.status.unwrap_or(EventStatus::Published);
    if requested == EventStatus::Published {
        return Ok((requested, query.organizer_id));
    }

    let Some(user) = user else {
        return Ok((EventStatus::Published, query.organizer_id));
    };
    match caller_profile(state, user).await? {
        Some(profile) if profile.is_admin => Ok((requested, query.organizer_id)),
        Some(profile) if profile.is_organizer => Ok((requested, Some(user.id))),
        _ => Ok((EventStatus::Published, query.organizer_id)),
    }
}

pub async fn list_events(
    state: &AppState,
    user: Option<&AuthUser>,
    query: &EventQuery,
) -> Result<EventList, AppError> {
    let page = query.page();
    let limit = query.limit();
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::ValidationError("Page is out of range".to_string()))?;

    let (status, organizer_id) = visible_scope(state, user, query).await?;

    // An unknown style name leaves the listing unfiltered.
    let style_id = match query.style.as_deref().filter(|s| !s.is_empty()) {
        Some(name) => state.store.find_dance_style(name).await?.map(|s| s.id),
        None => None,
    };

    let filter = EventFilter {
        status: Some(status),
        featured: query.featured,
        last_minute: query.last_minute,
        organizer_id,
        title_query: query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string),
        style_id,
        exclude_id: None,
        sort: query.sort,
        offset,
        limit,
    };

    let result = state.store.list_events(&filter).await?;
    let events = with_details(state.store.as_ref(), result.events).await?;

    Ok(EventList {
        events,
        count: result.total,
        page,
        limit,
    })
}

pub async fn get_event(state: &AppState, id: Uuid) -> Result<EventDetail, AppError> {
    let event = state.store.get_event(id).await?.ok_or_else(not_found)?;
    with_details(state.store.as_ref(), vec![event])
        .await?
        .pop()
        .ok_or_else(not_found)
}

pub async fn similar_events(state: &AppState, id: Uuid) -> Result<Vec<EventDetail>, AppError> {
    let filter = EventFilter {
        exclude_id: Some(id),
        limit: SIMILAR_EVENTS_LIMIT,
        ..EventFilter::default()
    };
    let result = state.store.list_events(&filter).await?;
    with_details(state.store.as_ref(), result.events).await
}

pub async fn organizer_events(state: &AppState, user: &AuthUser) -> Result<Vec<EventDetail>, AppError> {
    let events = state.store.events_by_organizer(user.id).await?;
    with_details(state.store.as_ref(), events).await
}

pub async fn create_event(
    state: &AppState,
    user: Option<&AuthUser>,
    input: EventInput,
) -> Result<Event, AppError> {
    let user = require_user(user, "create an event")?;

    let profile = caller_profile(state, user).await?;
    if !profile.as_ref().is_some_and(|p| p.can_organize()) {
        return Err(AppError::Forbidden(
            "You must be an organizer to create events".to_string(),
        ));
    }

    input.validate()?;
    let input = input.normalized();

    let event = state.store.insert_event(user.id, &input).await?;
    tracing::info!(event_id = %event.id, organizer_id = %user.id, "Event created");

    if let Some(names) = input.tags.as_deref().filter(|names| !names.is_empty()) {
        tags::link_tags(state.store.as_ref(), event.id, names).await;
    }

    Ok(event)
}

/// Loads the event and checks the caller may manage it.
async fn owned_event(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    action: &str,
) -> Result<Event, AppError> {
    let event = state.store.get_event(id).await?.ok_or_else(not_found)?;
    let is_admin = caller_profile(state, user)
        .await?
        .is_some_and(|p| p.is_admin);

    if event.organizer_id != user.id && !is_admin {
        return Err(AppError::Forbidden(format!(
            "You do not have permission to {action} this event"
        )));
    }
    Ok(event)
}

pub async fn update_event(
    state: &AppState,
    user: Option<&AuthUser>,
    id: Uuid,
    input: EventInput,
) -> Result<Event, AppError> {
    let user = require_user(user, "update an event")?;
    owned_event(state, user, id, "update").await?;

    input.validate()?;
    let input = input.normalized();

    if !state.store.update_event(id, &input).await? {
        return Err(not_found());
    }

    if let Some(names) = input.tags.as_deref() {
        tags::replace_tags(state.store.as_ref(), id, names).await;
    }

    tracing::info!(event_id = %id, user_id = %user.id, "Event updated");
    state.store.get_event(id).await?.ok_or_else(not_found)
}

pub async fn delete_event(state: &AppState, user: Option<&AuthUser>, id: Uuid) -> Result<(), AppError> {
    let user = require_user(user, "delete an event")?;
    owned_event(state, user, id, "delete").await?;

    if !state.store.delete_event(id).await? {
        return Err(not_found());
    }
    tracing::info!(event_id = %id, user_id = %user.id, "Event deleted");
    Ok(())
}

pub async fn publish_event(state: &AppState, user: Option<&AuthUser>, id: Uuid) -> Result<Event, AppError> {
    let user = require_user(user, "publish an event")?;

    let is_admin = caller_profile(state, user).await?.is_some_and(|p| p.is_admin);
    if !is_admin {
        return Err(AppError::Forbidden("Only admins can publish events".to_string()));
    }

    if !state.store.set_event_status(id, EventStatus::Published).await? {
        return Err(not_found());
    }
    tracing::info!(event_id = %id, admin_id = %user.id, "Event published");
    state.store.get_event(id).await?.ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventSort;
    use crate::services::testing::harness;
    use chrono::{Duration, Utc};

    fn input(title: &str, tags: Option<&[&str]>) -> EventInput {
        let start = Utc::now() + Duration::days(3);
        EventInput {
            title: title.to_string(),
            description: "All styles cypher with open floor".to_string(),
            location_id: None,
            start_time: start,
            end_time: start + Duration::hours(4),
            price_range: None,
            cover_image: None,
            has_live_dj: true,
            is_beginner_friendly: true,
            has_open_floor: true,
            age_restriction: None,
            dress_code: None,
            amenities: vec![],
            dance_styles: vec![],
            tags: tags.map(|t| t.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[tokio::test]
    async fn test_create_requires_login_and_organizer() {
        let h = harness();
        let dancer = h.user("dancer@example.com", false, false).await;

        let err = create_event(&h.state, None, input("Cypher", None)).await.unwrap_err();
        assert_eq!(err.public_message(), "You must be logged in to create an event");

        let err = create_event(&h.state, Some(&dancer), input("Cypher", None))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "You must be an organizer to create events");
    }

    #[tokio::test]
    async fn test_new_events_are_pending_with_tags() {
        let h = harness();
        let organizer = h.user("org@example.com", true, false).await;

        let event = create_event(&h.state, Some(&organizer), input("Cypher", Some(&["house", "house"])))
            .await
            .unwrap();

        assert_eq!(event.status, EventStatus::Pending);
        let detail = get_event(&h.state, event.id).await.unwrap();
        assert_eq!(detail.tags, vec!["house", "house"]);
        assert_eq!(detail.organizer.map(|o| o.id), Some(organizer.id));
    }

    #[tokio::test]
    async fn test_update_without_tags_keeps_links() {
        let h = harness();
        let organizer = h.user("org@example.com", true, false).await;
        let event = create_event(&h.state, Some(&organizer), input("Cypher", Some(&["krump"])))
            .await
            .unwrap();

        let updated = update_event(&h.state, Some(&organizer), event.id, input("Cypher Night", None))
            .await
            .unwrap();

        assert_eq!(updated.title, "Cypher Night");
        assert_eq!(h.store.junction_rows(event.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_admin_may_update_any_event() {
        let h = harness();
        let organizer = h.user("org@example.com", true, false).await;
        let admin = h.user("admin@example.com", false, true).await;
        let event = create_event(&h.state, Some(&organizer), input("Cypher", None))
            .await
            .unwrap();

        let updated = update_event(&h.state, Some(&admin), event.id, input("Renamed", None))
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn test_missing_event_is_not_found() {
        let h = harness();
        let admin = h.user("admin@example.com", false, true).await;

        let err = delete_event(&h.state, Some(&admin), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.public_message(), "Event not found");
    }

    #[tokio::test]
    async fn test_listing_only_shows_published_and_paginates() {
        let h = harness();
        let organizer = h.user("org@example.com", true, false).await;
        let admin = h.user("admin@example.com", false, true).await;

        for i in 0..3 {
            let event = create_event(&h.state, Some(&organizer), input(&format!("Jam {i}"), None))
                .await
                .unwrap();
            publish_event(&h.state, Some(&admin), event.id).await.unwrap();
        }
        create_event(&h.state, Some(&organizer), input("Still pending", None))
            .await
            .unwrap();

        let query = EventQuery {
            page: Some(2),
            limit: Some(2),
            sort: EventSort::Date,
            ..EventQuery::default()
        };
        let list = list_events(&h.state, None, &query).await.unwrap();

        assert_eq!(list.count, 3);
        assert_eq!(list.events.len(), 1);
        assert_eq!(list.page, 2);
    }

    #[tokio::test]
    async fn test_pending_listing_scoped_by_role() {
        let h = harness();
        let organizer = h.user("org@example.com", true, false).await;
        let rival = h.user("rival@example.com", true, false).await;
        let admin = h.user("admin@example.com", false, true).await;
        let dancer = h.user("dancer@example.com", false, false).await;
        create_event(&h.state, Some(&organizer), input("Own Pending", None)).await.unwrap();
        create_event(&h.state, Some(&rival), input("Rival Pending", None)).await.unwrap();

        let query = EventQuery {
            status: Some(EventStatus::Pending),
            ..EventQuery::default()
        };

        for caller in [None, Some(&dancer)] {
            let list = list_events(&h.state, caller, &query).await.unwrap();
            assert_eq!(list.count, 0);
        }

        let list = list_events(&h.state, Some(&organizer), &query).await.unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.events[0].event.title, "Own Pending");

        let list = list_events(&h.state, Some(&admin), &query).await.unwrap();
        assert_eq!(list.count, 2);
    }

    #[tokio::test]
    async fn test_page_offset_overflow_is_rejected() {
        let h = harness();
        let query = EventQuery {
            page: Some(i64::MAX),
            ..EventQuery::default()
        };

        let err = list_events(&h.state, None, &query).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_similar_excludes_current_and_caps_at_two() {
        let h = harness();
        let organizer = h.user("org@example.com", true, false).await;
        let admin = h.user("admin@example.com", false, true).await;

        let mut ids = Vec::new();
        for i in 0..4 {
            let event = create_event(&h.state, Some(&organizer), input(&format!("Jam {i}"), None))
                .await
                .unwrap();
            publish_event(&h.state, Some(&admin), event.id).await.unwrap();
            ids.push(event.id);
        }

        let similar = similar_events(&h.state, ids[0]).await.unwrap();
        assert_eq!(similar.len(), 2);
        assert!(similar.iter().all(|d| d.event.id != ids[0]));
    }
}
