use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Event, Location, ProfileSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rsvp_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Attending,
    Maybe,
    NotAttending,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rsvp {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RsvpCounts {
    pub attending: i64,
    pub maybe: i64,
    pub not_attending: i64,
    pub total: i64,
}

impl RsvpCounts {
    pub fn tally<'a>(rsvps: impl IntoIterator<Item = &'a Rsvp>) -> Self {
        rsvps
            .into_iter()
            .fold(Self::default(), |mut counts, rsvp| {
                match rsvp.status {
                    RsvpStatus::Attending => counts.attending += 1,
                    RsvpStatus::Maybe => counts.maybe += 1,
                    RsvpStatus::NotAttending => counts.not_attending += 1,
                }
                counts.total += 1;
                counts
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RsvpRequest {
    pub status: RsvpStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsvpWithUser {
    #[serde(flatten)]
    pub rsvp: Rsvp,
    pub user: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRsvps {
    pub counts: RsvpCounts,
    pub rsvps: Vec<RsvpWithUser>,
}

/// An RSVP from the caller's history with the event it points at.
#[derive(Debug, Clone, Serialize)]
pub struct UserRsvp {
    pub id: Uuid,
    pub status: RsvpStatus,
    pub event: Event,
    pub location: Option<Location>,
}
