use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Free-text annotation tied to one parent.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MedicalNote {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub date: String,
    #[serde(rename = "type")]
    pub note_type: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
