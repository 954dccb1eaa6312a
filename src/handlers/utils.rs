//! Ownership helpers shared by the appointment and note routers. Both
//! resources belong to the user transitively through their parent.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::filter::{FilterMap, SelectOptions};
use crate::database::gateway::Repository;
use crate::database::manager::DatabaseManager;
use crate::database::models::Parent;
use crate::error::{db_not_found, ApiError};
use crate::middleware::AuthUser;

/// Ids of every parent the caller owns, as bind-ready JSON values.
pub async fn owned_parent_ids(user: &AuthUser) -> Result<Vec<Value>, ApiError> {
    let parents: Repository<Parent> = Repository::new("parents", DatabaseManager::pool()?)?;
    let rows = parents
        .select_many(
            FilterMap::new().eq("user_id", json!(user.user_id)),
            SelectOptions::default(),
        )
        .await?;
    Ok(rows.into_iter().map(|p| json!(p.id)).collect())
}

/// Rewrite a 404's message for the resource being looked up; anything else
/// (500-class, 503) passes through untouched.
pub fn remap_not_found(err: ApiError, message: &str) -> ApiError {
    match err {
        ApiError::NotFound(_) => ApiError::not_found(message),
        other => other,
    }
}

/// 404 unless `parent_id` names a parent owned by the caller. The message is
/// the same whether the parent is missing or someone else's.
pub async fn assert_parent_owned(user: &AuthUser, parent_id: Uuid) -> Result<(), ApiError> {
    let parents: Repository<Parent> = Repository::new("parents", DatabaseManager::pool()?)?;
    parents
        .select_one(
            FilterMap::new()
                .eq("id", json!(parent_id))
                .eq("user_id", json!(user.user_id)),
        )
        .await
        .map_err(|e| db_not_found(e, "Parent not found"))?;
    Ok(())
}
