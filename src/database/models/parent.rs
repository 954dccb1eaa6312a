use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A tracked family member. Owned by exactly one user; appointments and
/// medical notes cascade when it goes.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub relationship: String,
    pub birth_date: Option<String>,
    pub age: Option<i32>,
    pub personality: Vec<String>,
    pub interests: Vec<String>,
    pub challenges: Vec<String>,
    pub goals: Vec<String>,
    pub communication_style: Option<String>,
    pub last_contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
