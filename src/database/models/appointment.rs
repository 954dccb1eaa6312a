use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Medical visit tied to one parent. `date` is an ISO calendar date and
/// `time` a 24-hour HH:MM string, stored exactly as submitted.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub date: String,
    pub time: String,
    pub doctor: String,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub completed: bool,
    pub follow_up_needed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
