use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::config::Config;
use crate::models::{
    DanceStyle, EmailLog, Event, EventFilter, EventInput, EventPage, EventSort, EventStatus,
    EventTagLink, Location, NewProfile, Profile, ProfileUpdate, Review, ReviewInput, Rsvp,
    RsvpStatus, Tag,
};

const EVENT_COLUMNS: &str = "id, title, description, organizer_id, location_id, start_time, \
     end_time, price_range, cover_image, status, has_live_dj, is_beginner_friendly, \
     has_open_floor, age_restriction, dress_code, amenities, dance_styles, is_featured, \
     is_last_minute, created_at, updated_at";

const PROFILE_COLUMNS: &str = "id, email, username, full_name, avatar_url, bio, website, \
     dance_styles, is_organizer, is_admin, created_at, updated_at";

const RSVP_COLUMNS: &str = "id, event_id, user_id, status, created_at, updated_at";

const REVIEW_COLUMNS: &str = "id, event_id, user_id, rating, music_rating, crowd_rating, \
     venue_rating, comment, created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

fn conflict_or_database(err: sqlx::Error, what: &str) -> StoreError {
    let is_unique = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);

    if is_unique {
        StoreError::Conflict(format!("{what} already exists"))
    } else {
        StoreError::Database(err)
    }
}

/// Escapes `%`, `_` and `\` so user text matches literally inside ILIKE.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_event_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    qb.push(" WHERE TRUE");

    if let Some(status) = filter.status {
        qb.push(" AND e.status = ").push_bind(status);
    }
    if filter.featured {
        qb.push(" AND e.is_featured");
    }
    if filter.last_minute {
        qb.push(" AND e.is_last_minute");
    }
    if let Some(organizer_id) = filter.organizer_id {
        qb.push(" AND e.organizer_id = ").push_bind(organizer_id);
    }
    if let Some(query) = &filter.title_query {
        qb.push(" AND e.title ILIKE ")
            .push_bind(format!("%{}%", escape_like(query)));
    }
    if let Some(style_id) = filter.style_id {
        qb.push(" AND ")
            .push_bind(style_id)
            .push(" = ANY(e.dance_styles)");
    }
    if let Some(exclude_id) = filter.exclude_id {
        qb.push(" AND e.id <> ").push_bind(exclude_id);
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        let profile = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn get_profiles(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ANY($1)");
        let profiles = sqlx::query_as(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = $1");
        let profile = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at");
        let profiles = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(profiles)
    }

    async fn insert_profile(&self, profile: &NewProfile) -> StoreResult<Profile> {
        let sql = format!(
            "INSERT INTO profiles (id, email, full_name) VALUES ($1, $2, $3) \
             RETURNING {PROFILE_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(profile.id)
            .bind(&profile.email)
            .bind(&profile.full_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or_database(e, "profile"))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<Profile>> {
        let sql = format!(
            "UPDATE profiles SET username = $2, full_name = $3, bio = $4, website = $5, \
             dance_styles = $6, updated_at = NOW() WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(id)
            .bind(&update.username)
            .bind(&update.full_name)
            .bind(&update.bio)
            .bind(&update.website)
            .bind(&update.dance_styles)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_or_database(e, "username"))
    }

    async fn insert_event(&self, organizer_id: Uuid, input: &EventInput) -> StoreResult<Event> {
        let sql = format!(
            "INSERT INTO events (title, description, organizer_id, location_id, start_time, \
             end_time, price_range, cover_image, status, has_live_dj, is_beginner_friendly, \
             has_open_floor, age_restriction, dress_code, amenities, dance_styles) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {EVENT_COLUMNS}"
        );
        let event = sqlx::query_as(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(organizer_id)
            .bind(input.location_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.price_range)
            .bind(&input.cover_image)
            .bind(EventStatus::Pending)
            .bind(input.has_live_dj)
            .bind(input.is_beginner_friendly)
            .bind(input.has_open_floor)
            .bind(&input.age_restriction)
            .bind(&input.dress_code)
            .bind(&input.amenities)
            .bind(&input.dance_styles)
            .fetch_one(&self.pool)
            .await?;
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let event = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update_event(&self, id: Uuid, input: &EventInput) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE events SET title = $2, description = $3, location_id = $4, start_time = $5, \
             end_time = $6, price_range = $7, cover_image = $8, has_live_dj = $9, \
             is_beginner_friendly = $10, has_open_floor = $11, age_restriction = $12, \
             dress_code = $13, amenities = $14, dance_styles = $15, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.location_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.price_range)
        .bind(&input.cover_image)
        .bind(input.has_live_dj)
        .bind(input.is_beginner_friendly)
        .bind(input.has_open_floor)
        .bind(&input.age_restriction)
        .bind(&input.dress_code)
        .bind(&input.amenities)
        .bind(&input.dance_styles)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_event_status(&self, id: Uuid, status: EventStatus) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE events SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_events(&self, filter: &EventFilter) -> StoreResult<EventPage> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM events e");
        push_event_filters(&mut count_query, filter);
        let (total,): (i64,) = count_query
            .build_query_as()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events e"));
        push_event_filters(&mut query, filter);
        query.push(match filter.sort {
            EventSort::Date => " ORDER BY e.start_time ASC",
            EventSort::Popularity => {
                " ORDER BY (SELECT COUNT(*) FROM rsvps r \
                 WHERE r.event_id = e.id AND r.status = 'attending') DESC, e.start_time ASC"
            }
            EventSort::Rating => {
                " ORDER BY (SELECT COALESCE(AVG(rv.rating), 0) FROM reviews rv \
                 WHERE rv.event_id = e.id) DESC, e.start_time ASC"
            }
        });
        query
            .push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let events = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(EventPage { events, total })
    }

    async fn events_by_organizer(&self, organizer_id: Uuid) -> StoreResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = $1 ORDER BY start_time DESC"
        );
        let events = sqlx::query_as(&sql)
            .bind(organizer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn latest_events_with_status(
        &self,
        status: EventStatus,
        limit: i64,
    ) -> StoreResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status = $1 \
             ORDER BY created_at DESC LIMIT $2"
        );
        let events = sqlx::query_as(&sql)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn recently_updated_events(&self, limit: i64) -> StoreResult<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY updated_at DESC LIMIT $1");
        let events = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn published_events_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status = $1 \
             AND start_time >= $2 AND start_time < $3 ORDER BY start_time ASC"
        );
        let events = sqlx::query_as(&sql)
            .bind(EventStatus::Published)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn get_locations(&self, ids: &[Uuid]) -> StoreResult<Vec<Location>> {
        let locations = sqlx::query_as(
            "SELECT id, name, address, city, state, latitude, longitude \
             FROM locations WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    async fn find_dance_style(&self, name: &str) -> StoreResult<Option<DanceStyle>> {
        let style = sqlx::query_as("SELECT id, name FROM dance_styles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(style)
    }

    async fn list_dance_styles(&self) -> StoreResult<Vec<DanceStyle>> {
        let styles = sqlx::query_as("SELECT id, name FROM dance_styles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(styles)
    }

    async fn find_tag_by_name(&self, name: &str) -> StoreResult<Option<Tag>> {
        let tag = sqlx::query_as("SELECT id, name FROM event_tags WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn insert_tag(&self, name: &str) -> StoreResult<Tag> {
        sqlx::query_as("INSERT INTO event_tags (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or_database(e, "tag"))
    }

    async fn link_tag(&self, event_id: Uuid, tag_id: Uuid) -> StoreResult<()> {
        sqlx::query("INSERT INTO event_tags_junction (event_id, tag_id) VALUES ($1, $2)")
            .bind(event_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_event_tags(&self, event_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM event_tags_junction WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn tags_for_events(&self, event_ids: &[Uuid]) -> StoreResult<Vec<EventTagLink>> {
        let links = sqlx::query_as(
            "SELECT j.event_id, j.tag_id, t.name FROM event_tags_junction j \
             JOIN event_tags t ON t.id = j.tag_id \
             WHERE j.event_id = ANY($1) ORDER BY j.id",
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let tags = sqlx::query_as("SELECT id, name FROM event_tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    async fn find_rsvp(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Rsvp>> {
        let sql = format!("SELECT {RSVP_COLUMNS} FROM rsvps WHERE event_id = $1 AND user_id = $2");
        let rsvp = sqlx::query_as(&sql)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rsvp)
    }

    async fn insert_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> StoreResult<Rsvp> {
        let sql = format!(
            "INSERT INTO rsvps (event_id, user_id, status) VALUES ($1, $2, $3) \
             RETURNING {RSVP_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(event_id)
            .bind(user_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or_database(e, "RSVP"))
    }

    async fn update_rsvp_status(&self, id: Uuid, status: RsvpStatus) -> StoreResult<()> {
        sqlx::query("UPDATE rsvps SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn rsvps_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Rsvp>> {
        let sql = format!("SELECT {RSVP_COLUMNS} FROM rsvps WHERE event_id = $1 ORDER BY created_at");
        let rsvps = sqlx::query_as(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rsvps)
    }

    async fn rsvps_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Rsvp>> {
        let sql = format!(
            "SELECT {RSVP_COLUMNS} FROM rsvps WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rsvps = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rsvps)
    }

    async fn attending_counts(&self, event_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, i64)>> {
        let counts = sqlx::query_as(
            "SELECT event_id, COUNT(*) FROM rsvps \
             WHERE event_id = ANY($1) AND status = 'attending' GROUP BY event_id",
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn reviews_for_event(&self, event_id: Uuid) -> StoreResult<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE event_id = $1 ORDER BY created_at DESC"
        );
        let reviews = sqlx::query_as(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn find_review(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Review>> {
        let sql =
            format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE event_id = $1 AND user_id = $2");
        let review = sqlx::query_as(&sql)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn insert_review(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        input: &ReviewInput,
    ) -> StoreResult<Review> {
        let sql = format!(
            "INSERT INTO reviews (event_id, user_id, rating, music_rating, crowd_rating, \
             venue_rating, comment) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {REVIEW_COLUMNS}"
        );
        let review = sqlx::query_as(&sql)
            .bind(event_id)
            .bind(user_id)
            .bind(input.rating)
            .bind(input.music_rating)
            .bind(input.crowd_rating)
            .bind(input.venue_rating)
            .bind(&input.comment)
            .fetch_one(&self.pool)
            .await?;
        Ok(review)
    }

    async fn update_review(&self, id: Uuid, input: &ReviewInput) -> StoreResult<()> {
        sqlx::query(
            "UPDATE reviews SET rating = $2, music_rating = $3, crowd_rating = $4, \
             venue_rating = $5, comment = $6, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(input.rating)
        .bind(input.music_rating)
        .bind(input.crowd_rating)
        .bind(input.venue_rating)
        .bind(&input.comment)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_email_log(&self, log: &EmailLog) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO email_logs (user_id, email, subject, content, sent_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(log.user_id)
        .bind(&log.email)
        .bind(&log.subject)
        .bind(&log.content)
        .bind(log.sent_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_events(&self, status: Option<EventStatus>) -> StoreResult<i64> {
        let (count,): (i64,) = match status {
            Some(status) => {
                sqlx::query_as("SELECT COUNT(*) FROM events WHERE status = $1")
                    .bind(status)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM events")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    async fn count_profiles(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_rsvps(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rsvps")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("krump"), "krump");
    }

    #[test]
    fn test_filters_render_in_order() {
        let filter = EventFilter {
            featured: true,
            title_query: Some("cypher".to_string()),
            style_id: Some(Uuid::nil()),
            ..EventFilter::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events e");
        push_event_filters(&mut query, &filter);

        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM events e WHERE TRUE AND e.status = $1 AND e.is_featured \
             AND e.title ILIKE $2 AND $3 = ANY(e.dance_styles)"
        );
    }
}
