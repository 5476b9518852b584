//! Persistence seam.
//!
//! Every operation the services need is a single row-level primitive here;
//! composition (tag reconciliation, RSVP upsert, authorization) lives in
//! [`crate::services`]. Postgres is the production backend; the in-memory
//! store backs the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    DanceStyle, EmailLog, Event, EventFilter, EventInput, EventPage, EventStatus, EventTagLink,
    Location, NewProfile, Profile, ProfileUpdate, Review, ReviewInput, Rsvp, RsvpStatus, Tag,
};

#[cfg(feature = "test-utils")]
pub mod memory;
pub mod postgres;

#[cfg(feature = "test-utils")]
pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Profiles
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    async fn get_profiles(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>>;
    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>>;
    async fn list_profiles(&self) -> StoreResult<Vec<Profile>>;
    async fn insert_profile(&self, profile: &NewProfile) -> StoreResult<Profile>;
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate)
        -> StoreResult<Option<Profile>>;

    // Events
    async fn insert_event(&self, organizer_id: Uuid, input: &EventInput) -> StoreResult<Event>;
    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>>;
    /// Returns `false` when no row matched.
    async fn update_event(&self, id: Uuid, input: &EventInput) -> StoreResult<bool>;
    async fn set_event_status(&self, id: Uuid, status: EventStatus) -> StoreResult<bool>;
    async fn delete_event(&self, id: Uuid) -> StoreResult<bool>;
    async fn list_events(&self, filter: &EventFilter) -> StoreResult<EventPage>;
    async fn events_by_organizer(&self, organizer_id: Uuid) -> StoreResult<Vec<Event>>;
    async fn latest_events_with_status(
        &self,
        status: EventStatus,
        limit: i64,
    ) -> StoreResult<Vec<Event>>;
    async fn recently_updated_events(&self, limit: i64) -> StoreResult<Vec<Event>>;
    async fn published_events_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>>;

    // Reference data
    async fn get_locations(&self, ids: &[Uuid]) -> StoreResult<Vec<Location>>;
    async fn find_dance_style(&self, name: &str) -> StoreResult<Option<DanceStyle>>;
    async fn list_dance_styles(&self) -> StoreResult<Vec<DanceStyle>>;

    // Tags
    async fn find_tag_by_name(&self, name: &str) -> StoreResult<Option<Tag>>;
    async fn insert_tag(&self, name: &str) -> StoreResult<Tag>;
    async fn link_tag(&self, event_id: Uuid, tag_id: Uuid) -> StoreResult<()>;
    /// Removes every junction row of the event, returning how many went.
    async fn clear_event_tags(&self, event_id: Uuid) -> StoreResult<u64>;
    /// Junction rows for the given events, in insertion order.
    async fn tags_for_events(&self, event_ids: &[Uuid]) -> StoreResult<Vec<EventTagLink>>;
    async fn list_tags(&self) -> StoreResult<Vec<Tag>>;

    // RSVPs
    async fn find_rsvp(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Rsvp>>;
    async fn insert_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> StoreResult<Rsvp>;
    async fn update_rsvp_status(&self, id: Uuid, status: RsvpStatus) -> StoreResult<()>;
    async fn rsvps_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Rsvp>>;
    /// Newest first.
    async fn rsvps_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Rsvp>>;
    /// `(event_id, attending count)` for each event that has attendees.
    async fn attending_counts(&self, event_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, i64)>>;

    // Reviews
    /// Newest first.
    async fn reviews_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Review>>;
    async fn find_review(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Review>>;
    async fn insert_review(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        input: &ReviewInput,
    ) -> StoreResult<Review>;
    async fn update_review(&self, id: Uuid, input: &ReviewInput) -> StoreResult<()>;

    // Email
    async fn insert_email_log(&self, log: &EmailLog) -> StoreResult<()>;

    // Dashboard counts
    async fn count_events(&self, status: Option<EventStatus>) -> StoreResult<i64>;
    async fn count_profiles(&self) -> StoreResult<i64>;
    async fn count_rsvps(&self) -> StoreResult<i64>;
}
