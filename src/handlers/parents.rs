//! Parent resource router. Every route is scoped to the authenticated user;
//! a parent that exists but belongs to someone else is indistinguishable
//! from one that does not exist.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::database::filter::{FilterMap, SelectOptions};
use crate::database::gateway::Repository;
use crate::database::manager::DatabaseManager;
use crate::database::models::Parent;
use crate::error::{db_not_found, ApiError};
use crate::middleware::AuthUser;
use crate::validation::{self, Validator};

fn repo() -> Result<Repository<Parent>, ApiError> {
    Ok(Repository::new("parents", DatabaseManager::pool()?)?)
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    // Malformed ids get the same 404 as missing rows
    Uuid::parse_str(id).map_err(|_| ApiError::not_found("Parent not found"))
}

fn owner_filter(id: Uuid, user: &AuthUser) -> FilterMap {
    FilterMap::new()
        .eq("id", json!(id))
        .eq("user_id", json!(user.user_id))
}

/// GET /api/parents - list the caller's parents, newest first
pub async fn list(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let parents = repo()?
        .select_many(
            FilterMap::new().eq("user_id", json!(user.user_id)),
            SelectOptions::order_desc("created_at"),
        )
        .await?;
    Ok(Json(json!({ "parents": parents })))
}

/// GET /api/parents/:id
pub async fn get(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let parent = repo()?
        .select_one(owner_filter(id, &user))
        .await
        .map_err(|e| db_not_found(e, "Parent not found"))?;
    Ok(Json(json!({ "parent": parent })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParentRequest {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub birth_date: Option<String>,
    pub age: Option<i32>,
    pub personality: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub challenges: Option<Vec<String>>,
    pub goals: Option<Vec<String>>,
    pub communication_style: Option<String>,
}

/// POST /api/parents
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateParentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.require("name", payload.name.as_deref());
    v.require("relationship", payload.relationship.as_deref());
    v.check_enum(
        "relationship",
        payload.relationship.as_deref(),
        validation::RELATIONSHIPS,
    );
    v.check_date("birthDate", payload.birth_date.as_deref());
    v.check_range(
        "age",
        payload.age.map(i64::from),
        validation::MIN_AGE,
        validation::MAX_AGE,
    );
    v.check_enum(
        "communicationStyle",
        payload.communication_style.as_deref(),
        validation::COMMUNICATION_STYLES,
    );
    v.finish()?;

    let mut row = Map::new();
    row.insert("user_id".to_string(), json!(user.user_id));
    row.insert(
        "name".to_string(),
        json!(payload.name.unwrap_or_default().trim()),
    );
    row.insert(
        "relationship".to_string(),
        json!(payload.relationship.unwrap_or_default().trim()),
    );
    if let Some(birth_date) = payload.birth_date {
        row.insert("birth_date".to_string(), json!(birth_date));
    }
    if let Some(age) = payload.age {
        row.insert("age".to_string(), json!(age));
    }
    row.insert(
        "personality".to_string(),
        json!(payload.personality.unwrap_or_default()),
    );
    row.insert(
        "interests".to_string(),
        json!(payload.interests.unwrap_or_default()),
    );
    row.insert(
        "challenges".to_string(),
        json!(payload.challenges.unwrap_or_default()),
    );
    row.insert("goals".to_string(), json!(payload.goals.unwrap_or_default()));
    if let Some(style) = payload.communication_style {
        row.insert("communication_style".to_string(), json!(style.trim()));
    }

    let parent = repo()?.insert(row).await?;
    Ok((StatusCode::CREATED, Json(json!({ "parent": parent }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParentRequest {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub birth_date: Option<String>,
    pub age: Option<i32>,
    pub personality: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub challenges: Option<Vec<String>>,
    pub goals: Option<Vec<String>>,
    pub communication_style: Option<String>,
    pub last_contact: Option<String>,
}

/// PUT /api/parents/:id - partial update over the allow-listed fields
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateParentRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;

    let mut v = Validator::new();
    v.check_not_blank("name", payload.name.as_deref());
    v.check_enum(
        "relationship",
        payload.relationship.as_deref(),
        validation::RELATIONSHIPS,
    );
    v.check_date("birthDate", payload.birth_date.as_deref());
    v.check_range(
        "age",
        payload.age.map(i64::from),
        validation::MIN_AGE,
        validation::MAX_AGE,
    );
    v.check_enum(
        "communicationStyle",
        payload.communication_style.as_deref(),
        validation::COMMUNICATION_STYLES,
    );
    v.check_timestamp("lastContact", payload.last_contact.as_deref());
    v.finish()?;

    let repo = repo()?;
    repo.select_one(owner_filter(id, &user))
        .await
        .map_err(|e| db_not_found(e, "Parent not found"))?;

    let mut patch = Map::new();
    if let Some(name) = payload.name {
        patch.insert("name".to_string(), json!(name.trim()));
    }
    if let Some(relationship) = payload.relationship {
        patch.insert("relationship".to_string(), json!(relationship.trim()));
    }
    if let Some(birth_date) = payload.birth_date {
        patch.insert("birth_date".to_string(), json!(birth_date));
    }
    if let Some(age) = payload.age {
        patch.insert("age".to_string(), json!(age));
    }
    if let Some(personality) = payload.personality {
        patch.insert("personality".to_string(), json!(personality));
    }
    if let Some(interests) = payload.interests {
        patch.insert("interests".to_string(), json!(interests));
    }
    if let Some(challenges) = payload.challenges {
        patch.insert("challenges".to_string(), json!(challenges));
    }
    if let Some(goals) = payload.goals {
        patch.insert("goals".to_string(), json!(goals));
    }
    if let Some(style) = payload.communication_style {
        patch.insert("communication_style".to_string(), json!(style.trim()));
    }
    if let Some(last_contact) = payload.last_contact {
        patch.insert("last_contact".to_string(), json!(last_contact));
    }

    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let parent = repo
        .update(owner_filter(id, &user), patch)
        .await
        .map_err(|e| db_not_found(e, "Parent not found"))?;
    Ok(Json(json!({ "parent": parent })))
}

/// DELETE /api/parents/:id - cascades to appointments and medical notes
pub async fn remove(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;

    let repo = repo()?;
    repo.select_one(owner_filter(id, &user))
        .await
        .map_err(|e| db_not_found(e, "Parent not found"))?;
    repo.delete(owner_filter(id, &user)).await?;

    Ok(Json(json!({ "message": "Parent deleted" })))
}
