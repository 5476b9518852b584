use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Location, ProfileSummary};
use crate::utils::error::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Published,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub organizer_id: Uuid,
    pub location_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price_range: Option<String>,
    pub cover_image: Option<String>,
    pub status: EventStatus,
    pub has_live_dj: bool,
    pub is_beginner_friendly: bool,
    pub has_open_floor: bool,
    pub age_restriction: Option<String>,
    pub dress_code: Option<String>,
    pub amenities: Vec<String>,
    pub dance_styles: Vec<Uuid>,
    pub is_featured: bool,
    pub is_last_minute: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable event fields, shared by create and update.
///
/// `tags` distinguishes "not sent" (`None`) from "sent empty" (`Some(vec![])`):
/// on update only the latter clears existing tag links.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub location_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price_range: Option<String>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub has_live_dj: bool,
    #[serde(default)]
    pub is_beginner_friendly: bool,
    #[serde(default)]
    pub has_open_floor: bool,
    pub age_restriction: Option<String>,
    pub dress_code: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub dance_styles: Vec<Uuid>,
    pub tags: Option<Vec<String>>,
}

impl EventInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().chars().count() < 3 {
            return Err(AppError::ValidationError(
                "Title must be at least 3 characters".to_string(),
            ));
        }
        if self.description.trim().chars().count() < 10 {
            return Err(AppError::ValidationError(
                "Description must be at least 10 characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Blank optional text is stored as NULL.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.price_range,
            &mut self.cover_image,
            &mut self.age_restriction,
            &mut self.dress_code,
        ] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSort {
    #[default]
    Date,
    Popularity,
    Rating,
}

/// Query-string form of an event listing request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub last_minute: bool,
    pub organizer_id: Option<Uuid>,
    pub q: Option<String>,
    pub style: Option<String>,
    #[serde(default)]
    pub sort: EventSort,
}

impl EventQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Resolved filter handed to the store.
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub featured: bool,
    pub last_minute: bool,
    pub organizer_id: Option<Uuid>,
    pub title_query: Option<String>,
    pub style_id: Option<Uuid>,
    pub exclude_id: Option<Uuid>,
    pub sort: EventSort,
    pub offset: i64,
    pub limit: i64,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            status: Some(EventStatus::Published),
            featured: false,
            last_minute: false,
            organizer_id: None,
            title_query: None,
            style_id: None,
            exclude_id: None,
            sort: EventSort::Date,
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: i64,
}

/// An event with its location, organizer, tag names and attendee count.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub location: Option<Location>,
    pub organizer: Option<ProfileSummary>,
    pub tags: Vec<String>,
    pub attendees: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventList {
    pub events: Vec<EventDetail>,
    pub count: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> EventInput {
        EventInput {
            title: "Cypher Night".to_string(),
            description: "Open cypher with a live DJ all night".to_string(),
            location_id: None,
            start_time: Utc::now(),
            end_time: Utc::now(),
            price_range: Some("  ".to_string()),
            cover_image: Some("https://img.example/cover.jpg".to_string()),
            has_live_dj: true,
            is_beginner_friendly: false,
            has_open_floor: true,
            age_restriction: Some(String::new()),
            dress_code: None,
            amenities: vec![],
            dance_styles: vec![],
            tags: None,
        }
    }

    #[test]
    fn test_normalized_blanks_become_none() {
        let normalized = input().normalized();
        assert_eq!(normalized.price_range, None);
        assert_eq!(normalized.age_restriction, None);
        assert!(normalized.cover_image.is_some());
    }

    #[test]
    fn test_validate_rejects_short_fields() {
        let mut short_title = input();
        short_title.title = "ab".to_string();
        assert!(short_title.validate().is_err());

        let mut short_description = input();
        short_description.description = "too short".to_string();
        assert!(short_description.validate().is_err());

        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_query_paging_defaults_and_bounds() {
        let query = EventQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);

        let query = EventQuery {
            page: Some(0),
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_tags_absent_vs_empty() {
        let absent: EventInput = serde_json::from_value(serde_json::json!({
            "title": "Cypher Night",
            "description": "Open cypher with a live DJ",
            "start_time": "2026-11-01T20:00:00Z",
            "end_time": "2026-11-01T23:00:00Z"
        }))
        .unwrap();
        assert!(absent.tags.is_none());

        let empty: EventInput = serde_json::from_value(serde_json::json!({
            "title": "Cypher Night",
            "description": "Open cypher with a live DJ",
            "start_time": "2026-11-01T20:00:00Z",
            "end_time": "2026-11-01T23:00:00Z",
            "tags": []
        }))
        .unwrap();
        assert_eq!(empty.tags, Some(vec![]));
    }
}
