use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::utils::open_session;
use crate::auth;
use crate::database::filter::FilterMap;
use crate::database::gateway::Repository;
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::error::ApiError;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login - verify credentials and open a session
///
/// The 401 message never says which credential was wrong.
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    v.require("email", payload.email.as_deref());
    v.require("password", payload.password.as_deref());
    v.finish()?;

    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();

    let pool = DatabaseManager::pool()?;
    let users: Repository<User> = Repository::new("users", pool.clone())?;

    let user = users
        .select_optional(FilterMap::new().eq("email", json!(email)))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !auth::verify_password(&password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    tracing::info!(user_id = %user.id, "user logged in");

    let (token, session) = open_session(pool, &user).await?;

    Ok(Json(json!({
        "user": user,
        "session": {
            "token": token,
            "expiresAt": session.expires_at,
        },
    })))
}
