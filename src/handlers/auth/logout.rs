use axum::{extract::Extension, response::Json};
use serde_json::{json, Value};

use crate::database::filter::FilterMap;
use crate::database::gateway::Repository;
use crate::database::manager::DatabaseManager;
use crate::database::models::Session;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// POST /api/auth/logout - revoke the calling session
pub async fn logout(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let sessions: Repository<Session> = Repository::new("sessions", DatabaseManager::pool()?)?;
    sessions
        .delete(FilterMap::new().eq("id", json!(user.session_id)))
        .await?;

    tracing::info!(user_id = %user.user_id, "session revoked");

    Ok(Json(json!({ "message": "Logged out" })))
}
