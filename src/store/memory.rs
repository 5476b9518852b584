//! In-memory [`Store`] for tests.
//!
//! Mirrors the Postgres schema closely enough for the service and HTTP
//! suites: insertion order is preserved, tag names and (event, user) RSVP
//! pairs are unique, and deleting an event cascades to its rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    DanceStyle, EmailLog, Event, EventFilter, EventInput, EventPage, EventSort, EventStatus,
    EventTagLink, Location, NewProfile, Profile, ProfileUpdate, Review, ReviewInput, Rsvp,
    RsvpStatus, Tag,
};

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    events: Vec<Event>,
    locations: Vec<Location>,
    dance_styles: Vec<DanceStyle>,
    tags: Vec<Tag>,
    junction: Vec<(Uuid, Uuid)>,
    rsvps: Vec<Rsvp>,
    reviews: Vec<Review>,
    email_logs: Vec<EmailLog>,
    failing_tag_names: HashSet<String>,
}

impl Tables {
    fn attending(&self, event_id: Uuid) -> i64 {
        self.rsvps
            .iter()
            .filter(|r| r.event_id == event_id && r.status == RsvpStatus::Attending)
            .count() as i64
    }

    fn average_rating(&self, event_id: Uuid) -> f64 {
        let ratings: Vec<f64> = self
            .reviews
            .iter()
            .filter(|r| r.event_id == event_id)
            .map(|r| f64::from(r.rating))
            .collect();
        if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        }
    }

    fn matches(&self, event: &Event, filter: &EventFilter) -> bool {
        filter.status.map_or(true, |s| event.status == s)
            && (!filter.featured || event.is_featured)
            && (!filter.last_minute || event.is_last_minute)
            && filter.organizer_id.map_or(true, |id| event.organizer_id == id)
            && filter.title_query.as_deref().map_or(true, |q| {
                event.title.to_lowercase().contains(&q.to_lowercase())
            })
            && filter
                .style_id
                .map_or(true, |id| event.dance_styles.contains(&id))
            && filter.exclude_id.map_or(true, |id| event.id != id)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Sets the organizer/admin flags, which have no API of their own.
    pub fn set_roles(&self, user_id: Uuid, is_organizer: bool, is_admin: bool) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if let Some(profile) = tables.profiles.iter_mut().find(|p| p.id == user_id) {
            profile.is_organizer = is_organizer;
            profile.is_admin = is_admin;
        }
        Ok(())
    }

    /// Marks an event as featured and/or last-minute.
    pub fn set_highlights(&self, event_id: Uuid, featured: bool, last_minute: bool) -> StoreResult<()> {
        let mut tables = self.tables()?;
        if let Some(event) = tables.events.iter_mut().find(|e| e.id == event_id) {
            event.is_featured = featured;
            event.is_last_minute = last_minute;
        }
        Ok(())
    }

    pub fn add_location(&self, name: &str, city: Option<&str>) -> StoreResult<Location> {
        let location = Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: None,
            city: city.map(str::to_string),
            state: None,
            latitude: None,
            longitude: None,
        };
        self.tables()?.locations.push(location.clone());
        Ok(location)
    }

    pub fn add_dance_style(&self, name: &str) -> StoreResult<DanceStyle> {
        let style = DanceStyle {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.tables()?.dance_styles.push(style.clone());
        Ok(style)
    }

    /// Makes every later `insert_tag` for `name` fail.
    pub fn fail_tag_inserts_for(&self, name: &str) -> StoreResult<()> {
        self.tables()?.failing_tag_names.insert(name.to_string());
        Ok(())
    }

    pub fn junction_rows(&self, event_id: Uuid) -> StoreResult<usize> {
        Ok(self
            .tables()?
            .junction
            .iter()
            .filter(|(e, _)| *e == event_id)
            .count())
    }

    pub fn email_logs(&self) -> StoreResult<Vec<EmailLog>> {
        Ok(self.tables()?.email_logs.clone())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.tables()?.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn get_profiles(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>> {
        Ok(self
            .tables()?
            .profiles
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        Ok(self
            .tables()?
            .profiles
            .iter()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        Ok(self.tables()?.profiles.clone())
    }

    async fn insert_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        let mut tables = self.tables()?;
        if tables
            .profiles
            .iter()
            .any(|p| p.id == profile.id || p.email == profile.email)
        {
            return Err(StoreError::Conflict("profile already exists".to_string()));
        }

        let now = Utc::now();
        let row = Profile {
            id: profile.id,
            email: profile.email.clone(),
            username: None,
            full_name: profile.full_name.clone(),
            avatar_url: None,
            bio: None,
            website: None,
            dance_styles: Vec::new(),
            is_organizer: false,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        tables.profiles.push(row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Profile>> {
        let mut tables = self.tables()?;
        if let Some(username) = &update.username {
            if tables
                .profiles
                .iter()
                .any(|p| p.id != id && p.username.as_ref() == Some(username))
            {
                return Err(StoreError::Conflict("username already exists".to_string()));
            }
        }

        let Some(profile) = tables.profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        profile.username = update.username.clone();
        profile.full_name = Some(update.full_name.clone());
        profile.bio = update.bio.clone();
        profile.website = update.website.clone();
        profile.dance_styles = update.dance_styles.clone();
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn insert_event(&self, organizer_id: Uuid, input: &EventInput) -> StoreResult<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            description: input.description.clone(),
            organizer_id,
            location_id: input.location_id,
            start_time: input.start_time,
            end_time: input.end_time,
            price_range: input.price_range.clone(),
            cover_image: input.cover_image.clone(),
            status: EventStatus::Pending,
            has_live_dj: input.has_live_dj,
            is_beginner_friendly: input.is_beginner_friendly,
            has_open_floor: input.has_open_floor,
            age_restriction: input.age_restriction.clone(),
            dress_code: input.dress_code.clone(),
            amenities: input.amenities.clone(),
            dance_styles: input.dance_styles.clone(),
            is_featured: false,
            is_last_minute: false,
            created_at: now,
            updated_at: now,
        };
        self.tables()?.events.push(event.clone());
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.tables()?.events.iter().find(|e| e.id == id).cloned())
    }

    async fn update_event(&self, id: Uuid, input: &EventInput) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        let Some(event) = tables.events.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        event.title = input.title.clone();
        event.description = input.description.clone();
        event.location_id = input.location_id;
        event.start_time = input.start_time;
        event.end_time = input.end_time;
        event.price_range = input.price_range.clone();
        event.cover_image = input.cover_image.clone();
        event.has_live_dj = input.has_live_dj;
        event.is_beginner_friendly = input.is_beginner_friendly;
        event.has_open_floor = input.has_open_floor;
        event.age_restriction = input.age_restriction.clone();
        event.dress_code = input.dress_code.clone();
        event.amenities = input.amenities.clone();
        event.dance_styles = input.dance_styles.clone();
        event.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_event_status(&self, id: Uuid, status: EventStatus) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        let Some(event) = tables.events.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        event.status = status;
        event.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        if tables.events.len() == before {
            return Ok(false);
        }
        tables.junction.retain(|(event_id, _)| *event_id != id);
        tables.rsvps.retain(|r| r.event_id != id);
        tables.reviews.retain(|r| r.event_id != id);
        Ok(true)
    }

    async fn list_events(&self, filter: &EventFilter) -> StoreResult<EventPage> {
        let tables = self.tables()?;
        let mut events: Vec<Event> = tables
            .events
            .iter()
            .filter(|e| tables.matches(e, filter))
            .cloned()
            .collect();

        events.sort_by_key(|e| e.start_time);
        match filter.sort {
            EventSort::Date => {}
            EventSort::Popularity => {
                events.sort_by_key(|e| std::cmp::Reverse(tables.attending(e.id)));
            }
            EventSort::Rating => {
                events.sort_by(|a, b| {
                    tables
                        .average_rating(b.id)
                        .total_cmp(&tables.average_rating(a.id))
                });
            }
        }

        let total = events.len() as i64;
        let events = events
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();

        Ok(EventPage { events, total })
    }

    async fn events_by_organizer(&self, organizer_id: Uuid) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .tables()?
            .events
            .iter()
            .filter(|e| e.organizer_id == organizer_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| std::cmp::Reverse(e.start_time));
        Ok(events)
    }

    async fn latest_events_with_status(
        &self,
        status: EventStatus,
        limit: i64,
    ) -> StoreResult<Vec<Event>> {
        // Reverse insertion order doubles as created_at DESC.
        Ok(self
            .tables()?
            .events
            .iter()
            .rev()
            .filter(|e| e.status == status)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn recently_updated_events(&self, limit: i64) -> StoreResult<Vec<Event>> {
        let mut events = self.tables()?.events.clone();
        events.reverse();
        events.sort_by_key(|e| std::cmp::Reverse(e.updated_at));
        events.truncate(limit.max(0) as usize);
        Ok(events)
    }

    async fn published_events_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .tables()?
            .events
            .iter()
            .filter(|e| e.status == EventStatus::Published && e.start_time >= from && e.start_time < to)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start_time);
        Ok(events)
    }

    async fn get_locations(&self, ids: &[Uuid]) -> StoreResult<Vec<Location>> {
        Ok(self
            .tables()?
            .locations
            .iter()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect())
    }

    async fn find_dance_style(&self, name: &str) -> StoreResult<Option<DanceStyle>> {
        Ok(self
            .tables()?
            .dance_styles
            .iter()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn list_dance_styles(&self) -> StoreResult<Vec<DanceStyle>> {
        let mut styles = self.tables()?.dance_styles.clone();
        styles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(styles)
    }

    async fn find_tag_by_name(&self, name: &str) -> StoreResult<Option<Tag>> {
        Ok(self.tables()?.tags.iter().find(|t| t.name == name).cloned())
    }

    async fn insert_tag(&self, name: &str) -> StoreResult<Tag> {
        let mut tables = self.tables()?;
        if tables.failing_tag_names.contains(name) || tables.tags.iter().any(|t| t.name == name) {
            return Err(StoreError::Conflict(format!("tag '{name}' already exists")));
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        tables.tags.push(tag.clone());
        Ok(tag)
    }

    async fn link_tag(&self, event_id: Uuid, tag_id: Uuid) -> StoreResult<()> {
        self.tables()?.junction.push((event_id, tag_id));
        Ok(())
    }

    async fn clear_event_tags(&self, event_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables()?;
        let before = tables.junction.len();
        tables.junction.retain(|(e, _)| *e != event_id);
        Ok((before - tables.junction.len()) as u64)
    }

    async fn tags_for_events(&self, event_ids: &[Uuid]) -> StoreResult<Vec<EventTagLink>> {
        let tables = self.tables()?;
        let names: HashMap<Uuid, &str> = tables
            .tags
            .iter()
            .map(|t| (t.id, t.name.as_str()))
            .collect();

        Ok(tables
            .junction
            .iter()
            .filter(|(event_id, _)| event_ids.contains(event_id))
            .filter_map(|(event_id, tag_id)| {
                names.get(tag_id).map(|name| EventTagLink {
                    event_id: *event_id,
                    tag_id: *tag_id,
                    name: (*name).to_string(),
                })
            })
            .collect())
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let mut tags = self.tables()?.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn find_rsvp(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Rsvp>> {
        Ok(self
            .tables()?
            .rsvps
            .iter()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> StoreResult<Rsvp> {
        let mut tables = self.tables()?;
        if tables
            .rsvps
            .iter()
            .any(|r| r.event_id == event_id && r.user_id == user_id)
        {
            return Err(StoreError::Conflict("RSVP already exists".to_string()));
        }
        let now = Utc::now();
        let rsvp = Rsvp {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            status,
            created_at: now,
            updated_at: now,
        };
        tables.rsvps.push(rsvp.clone());
        Ok(rsvp)
    }

    async fn update_rsvp_status(&self, id: Uuid, status: RsvpStatus) -> StoreResult<()> {
        if let Some(rsvp) = self.tables()?.rsvps.iter_mut().find(|r| r.id == id) {
            rsvp.status = status;
            rsvp.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn rsvps_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Rsvp>> {
        Ok(self
            .tables()?
            .rsvps
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn rsvps_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Rsvp>> {
        Ok(self
            .tables()?
            .rsvps
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn attending_counts(&self, event_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, i64)>> {
        let tables = self.tables()?;
        Ok(event_ids
            .iter()
            .map(|id| (*id, tables.attending(*id)))
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    async fn reviews_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Review>> {
        Ok(self
            .tables()?
            .reviews
            .iter()
            .rev()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn find_review(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self
            .tables()?
            .reviews
            .iter()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_review(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        input: &ReviewInput,
    ) -> StoreResult<Review> {
        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            rating: input.rating,
            music_rating: input.music_rating,
            crowd_rating: input.crowd_rating,
            venue_rating: input.venue_rating,
            comment: input.comment.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tables()?.reviews.push(review.clone());
        Ok(review)
    }

    async fn update_review(&self, id: Uuid, input: &ReviewInput) -> StoreResult<()> {
        if let Some(review) = self.tables()?.reviews.iter_mut().find(|r| r.id == id) {
            review.rating = input.rating;
            review.music_rating = input.music_rating;
            review.crowd_rating = input.crowd_rating;
            review.venue_rating = input.venue_rating;
            review.comment = input.comment.clone();
            review.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_email_log(&self, log: &EmailLog) -> StoreResult<()> {
        self.tables()?.email_logs.push(log.clone());
        Ok(())
    }

    async fn count_events(&self, status: Option<EventStatus>) -> StoreResult<i64> {
        Ok(self
            .tables()?
            .events
            .iter()
            .filter(|e| status.map_or(true, |s| e.status == s))
            .count() as i64)
    }

    async fn count_profiles(&self) -> StoreResult<i64> {
        Ok(self.tables()?.profiles.len() as i64)
    }

    async fn count_rsvps(&self) -> StoreResult<i64> {
        Ok(self.tables()?.rsvps.len() as i64)
    }
}
