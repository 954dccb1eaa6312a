use chrono::{Duration, Utc};
use serde_json::{json, Map};
use sqlx::PgPool;

use crate::auth::{self, Claims};
use crate::config;
use crate::database::gateway::Repository;
use crate::database::models::{Session, User};
use crate::error::ApiError;

/// Insert a session row for the user and mint the bearer token that names it.
pub async fn open_session(pool: PgPool, user: &User) -> Result<(String, Session), ApiError> {
    let config = config::config();

    let sessions: Repository<Session> = Repository::new("sessions", pool)?;

    let expires_at = (Utc::now() + Duration::hours(config.jwt_expiry_hours)).to_rfc3339();
    let mut row = Map::new();
    row.insert("user_id".to_string(), json!(user.id));
    row.insert("expires_at".to_string(), json!(expires_at));
    let session = sessions.insert(row).await?;

    let claims = Claims::new(user.id, session.id, user.email.clone(), config.jwt_expiry_hours);
    let token = auth::generate_token(&claims, &config.jwt_secret)
        .map_err(|_| ApiError::internal_server_error("Failed to issue session token"))?;

    Ok((token, session))
}
