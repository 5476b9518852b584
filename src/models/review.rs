use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::ProfileSummary;
use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub music_rating: Option<i16>,
    pub crowd_rating: Option<i16>,
    pub venue_rating: Option<i16>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i16,
    pub music_rating: Option<i16>,
    pub crowd_rating: Option<i16>,
    pub venue_rating: Option<i16>,
    pub comment: Option<String>,
}

impl ReviewInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::ValidationError(
                "Please select a rating".to_string(),
            ));
        }

        for (label, value) in [
            ("Music", self.music_rating),
            ("Crowd", self.crowd_rating),
            ("Venue", self.venue_rating),
        ] {
            if value.is_some_and(|v| !(1..=5).contains(&v)) {
                return Err(AppError::ValidationError(format!(
                    "{label} rating must be between 1 and 5"
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub reviews: Vec<ReviewWithAuthor>,
    pub average_rating: f64,
    pub count: usize,
}
