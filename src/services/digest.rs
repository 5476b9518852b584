use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::caller_profile;
use super::rsvps::EMAIL_DATE_FORMAT;
use crate::auth::AuthUser;
use crate::email::templates::{self, DigestEntry};
use crate::models::{Event, Profile};
use crate::state::AppState;
use crate::utils::error::AppError;

const DIGEST_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Events a profile would care about: those sharing a dance style, or all
/// of them when the profile has not picked any.
fn matching_events<'a>(profile: &Profile, events: &'a [Event]) -> Vec<&'a Event> {
    if profile.dance_styles.is_empty() {
        return events.iter().collect();
    }
    events
        .iter()
        .filter(|e| e.dance_styles.iter().any(|s| profile.dance_styles.contains(s)))
        .collect()
}

/// Mails every profile the published events of the coming week.
pub async fn send_weekly_digest(state: &AppState, user: &AuthUser) -> Result<DigestReport, AppError> {
    let is_admin = caller_profile(state, user).await?.is_some_and(|p| p.is_admin);
    if !is_admin {
        return Err(AppError::Forbidden(
            "Only admins can send the weekly digest".to_string(),
        ));
    }

    let now = Utc::now();
    let events = state
        .store
        .published_events_between(now, now + Duration::days(DIGEST_WINDOW_DAYS))
        .await?;

    let location_ids: Vec<Uuid> = events.iter().filter_map(|e| e.location_id).collect();
    let locations: HashMap<Uuid, String> = state
        .store
        .get_locations(&location_ids)
        .await?
        .into_iter()
        .map(|l| (l.id, l.label()))
        .collect();

    let mut report = DigestReport::default();
    for profile in state.store.list_profiles().await? {
        let entries: Vec<DigestEntry> = matching_events(&profile, &events)
            .into_iter()
            .map(|event| DigestEntry {
                title: event.title.clone(),
                date: event.start_time.format(EMAIL_DATE_FORMAT).to_string(),
                location: event
                    .location_id
                    .and_then(|id| locations.get(&id).cloned())
                    .unwrap_or_else(|| "TBA".to_string()),
            })
            .collect();

        if entries.is_empty() {
            report.skipped += 1;
            continue;
        }

        let message = templates::weekly_digest(
            &profile.email,
            profile.display_name(),
            &entries,
            &state.config.site_url,
        );
        match state.mailer.send(&message).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                tracing::error!(user_id = %profile.id, error = ?e, "Failed to send weekly digest");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        sent = report.sent,
        skipped = report.skipped,
        failed = report.failed,
        "Weekly digest finished"
    );
    Ok(report)
}
