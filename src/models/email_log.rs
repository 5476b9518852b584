use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailLog {
    pub user_id: Uuid,
    pub email: String,
    pub subject: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}
