use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// One junction row resolved to its tag.
#[derive(Debug, Clone, FromRow)]
pub struct EventTagLink {
    pub event_id: Uuid,
    pub tag_id: Uuid,
    pub name: String,
}
