use axum::{http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::utils::open_session;
use crate::auth;
use crate::database::gateway::Repository;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::User;
use crate::error::ApiError;
use crate::validation::{self, Validator};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// POST /api/auth/register - create an account and open a session
///
/// A duplicate email is reported as a plain validation failure, never as a
/// silent login attempt: a login fallback would let anyone who knows a
/// victim's email probe passwords through this endpoint.
pub async fn register(
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.require("email", payload.email.as_deref());
    v.check_email("email", payload.email.as_deref());
    v.require("password", payload.password.as_deref());
    v.check_min_len("password", payload.password.as_deref(), validation::MIN_PASSWORD_LEN);
    v.require("name", payload.name.as_deref());
    v.finish()?;

    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();
    let name = payload.name.unwrap_or_default().trim().to_string();

    let password_hash = auth::hash_password(&password)
        .map_err(|_| ApiError::internal_server_error("Failed to hash password"))?;

    let pool = DatabaseManager::pool()?;
    let users: Repository<User> = Repository::new("users", pool.clone())?;

    let mut row = Map::new();
    row.insert("email".to_string(), json!(email));
    row.insert("name".to_string(), json!(name));
    row.insert("password_hash".to_string(), json!(password_hash));

    let user = match users.insert(row).await {
        Ok(user) => user,
        Err(DatabaseError::Constraint(_)) => {
            let mut field_errors = HashMap::new();
            field_errors.insert(
                "email".to_string(),
                "An account with this email already exists".to_string(),
            );
            return Err(ApiError::validation_error("Registration failed", field_errors));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "user registered");

    let (token, session) = open_session(pool, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user,
            "session": {
                "token": token,
                "expiresAt": session.expires_at,
            },
        })),
    ))
}
