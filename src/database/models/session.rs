use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Server-side session row backing a bearer token. Deleting the row revokes
/// the token; expiry is an RFC 3339 timestamp checked on every request.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: String,
    pub created_at: DateTime<Utc>,
}
