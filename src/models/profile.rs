use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub dance_styles: Vec<Uuid>,
    pub is_organizer: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn can_organize(&self) -> bool {
        self.is_organizer || self.is_admin
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("Dancer")
    }
}

/// Public slice of a profile attached to events, RSVPs and reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            username: profile.username.clone(),
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub full_name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub dance_styles: Vec<Uuid>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            let len = username.chars().count();
            if !(3..=50).contains(&len) {
                return Err(AppError::ValidationError(
                    "Username must be between 3 and 50 characters".to_string(),
                ));
            }
        }

        let name_len = self.full_name.trim().chars().count();
        if !(2..=100).contains(&name_len) {
            return Err(AppError::ValidationError(
                "Full name must be between 2 and 100 characters".to_string(),
            ));
        }

        if self.bio.as_deref().is_some_and(|b| b.chars().count() > 500) {
            return Err(AppError::ValidationError(
                "Bio must be at most 500 characters".to_string(),
            ));
        }

        if let Some(website) = self.website.as_deref().filter(|w| !w.is_empty()) {
            if reqwest::Url::parse(website)
                .map(|url| !matches!(url.scheme(), "http" | "https"))
                .unwrap_or(true)
            {
                return Err(AppError::ValidationError(
                    "Website must be a valid URL".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Empty optional strings are stored as NULL.
    pub fn normalized(mut self) -> Self {
        for field in [&mut self.username, &mut self.bio, &mut self.website] {
            if field.as_deref().is_some_and(str::is_empty) {
                *field = None;
            }
        }
        self
    }
}
