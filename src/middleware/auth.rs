use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::auth;
use crate::config;
use crate::database::filter::FilterMap;
use crate::database::gateway::Repository;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Session, User};
use crate::error::ApiError;

/// Request-scoped identity resolved from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub email: String,
    pub name: String,
}

/// Bearer-token middleware: extract the token, decode its claims, then
/// re-validate against the session and user rows on every request. No
/// validation result is cached. Any failure is a generic 401.
pub async fn require_auth(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let claims = auth::decode_token(&token, &config::config().jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let pool = DatabaseManager::pool()?;

    let sessions: Repository<Session> = Repository::new("sessions", pool.clone())?;
    let session = sessions
        .select_optional(FilterMap::new().eq("id", json!(claims.session_id)))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    if session.user_id != claims.user_id || session_expired(&session.expires_at) {
        return Err(ApiError::unauthorized("Invalid or expired token"));
    }

    let users: Repository<User> = Repository::new("users", pool)?;
    let user = users
        .select_optional(FilterMap::new().eq("id", json!(claims.user_id)))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthUser {
        user_id: user.id,
        session_id: session.id,
        email: user.email,
        name: user.name,
    });

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Unparseable expiry counts as expired.
fn session_expired(expires_at: &str) -> bool {
    match DateTime::parse_from_rfc3339(expires_at) {
        Ok(t) => t < Utc::now(),
        Err(_) => true,
    }
}
