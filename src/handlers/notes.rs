//! Medical-note resource router. Same transitive-ownership shape as
//! appointments.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::utils::{assert_parent_owned, owned_parent_ids, remap_not_found};
use crate::database::filter::{FilterMap, SelectOptions};
use crate::database::gateway::Repository;
use crate::database::manager::DatabaseManager;
use crate::database::models::MedicalNote;
use crate::error::{db_not_found, ApiError};
use crate::middleware::AuthUser;
use crate::validation::{self, Validator};

fn repo() -> Result<Repository<MedicalNote>, ApiError> {
    Ok(Repository::new("medical_notes", DatabaseManager::pool()?)?)
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found("Note not found"))
}

async fn fetch_owned(user: &AuthUser, id: Uuid) -> Result<MedicalNote, ApiError> {
    let note = repo()?
        .select_one(FilterMap::new().eq("id", json!(id)))
        .await
        .map_err(|e| db_not_found(e, "Note not found"))?;

    assert_parent_owned(user, note.parent_id)
        .await
        .map_err(|e| remap_not_found(e, "Note not found"))?;

    Ok(note)
}

/// GET /api/notes - every note across the caller's parents
pub async fn list(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let parent_ids = owned_parent_ids(&user).await?;
    if parent_ids.is_empty() {
        return Ok(Json(json!({ "notes": [] })));
    }

    let notes = repo()?
        .select_many(
            FilterMap::new().is_in("parent_id", parent_ids),
            SelectOptions::order_desc("date"),
        )
        .await?;
    Ok(Json(json!({ "notes": notes })))
}

/// GET /api/notes/parent/:parentId
pub async fn list_for_parent(
    Extension(user): Extension<AuthUser>,
    Path(parent_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let parent_id =
        Uuid::parse_str(&parent_id).map_err(|_| ApiError::not_found("Parent not found"))?;
    assert_parent_owned(&user, parent_id).await?;

    let notes = repo()?
        .select_many(
            FilterMap::new().eq("parent_id", json!(parent_id)),
            SelectOptions::order_desc("date"),
        )
        .await?;
    Ok(Json(json!({ "notes": notes })))
}

/// GET /api/notes/type/:type - notes of one type across the caller's parents
pub async fn list_by_type(
    Extension(user): Extension<AuthUser>,
    Path(note_type): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    v.check_enum("type", Some(&note_type), validation::NOTE_TYPES);
    v.finish()?;

    let parent_ids = owned_parent_ids(&user).await?;
    if parent_ids.is_empty() {
        return Ok(Json(json!({ "notes": [] })));
    }

    let notes = repo()?
        .select_many(
            FilterMap::new()
                .is_in("parent_id", parent_ids)
                .eq("note_type", json!(note_type.trim())),
            SelectOptions::order_desc("date"),
        )
        .await?;
    Ok(Json(json!({ "notes": notes })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub parent_id: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub note_type: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// POST /api/notes
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.require("parentId", payload.parent_id.as_deref());
    v.check_uuid("parentId", payload.parent_id.as_deref());
    v.require("date", payload.date.as_deref());
    v.check_date("date", payload.date.as_deref());
    v.require("type", payload.note_type.as_deref());
    v.check_enum("type", payload.note_type.as_deref(), validation::NOTE_TYPES);
    v.require("title", payload.title.as_deref());
    v.require("content", payload.content.as_deref());
    v.finish()?;

    let parent_id = Uuid::parse_str(payload.parent_id.unwrap_or_default().trim())
        .map_err(|_| ApiError::not_found("Parent not found"))?;
    assert_parent_owned(&user, parent_id).await?;

    let mut row = Map::new();
    row.insert("parent_id".to_string(), json!(parent_id));
    row.insert("date".to_string(), json!(payload.date.unwrap_or_default()));
    row.insert(
        "note_type".to_string(),
        json!(payload.note_type.unwrap_or_default().trim()),
    );
    row.insert(
        "title".to_string(),
        json!(payload.title.unwrap_or_default().trim()),
    );
    row.insert(
        "content".to_string(),
        json!(payload.content.unwrap_or_default()),
    );

    let note = repo()?.insert(row).await?;
    Ok((StatusCode::CREATED, Json(json!({ "note": note }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub note_type: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// PUT /api/notes/:id - partial update over the allow-listed fields
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;

    let mut v = Validator::new();
    v.check_date("date", payload.date.as_deref());
    v.check_enum("type", payload.note_type.as_deref(), validation::NOTE_TYPES);
    v.check_not_blank("title", payload.title.as_deref());
    v.check_not_blank("content", payload.content.as_deref());
    v.finish()?;

    fetch_owned(&user, id).await?;

    let mut patch = Map::new();
    if let Some(date) = payload.date {
        patch.insert("date".to_string(), json!(date));
    }
    if let Some(note_type) = payload.note_type {
        patch.insert("note_type".to_string(), json!(note_type.trim()));
    }
    if let Some(title) = payload.title {
        patch.insert("title".to_string(), json!(title.trim()));
    }
    if let Some(content) = payload.content {
        patch.insert("content".to_string(), json!(content));
    }

    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let note = repo()?
        .update(FilterMap::new().eq("id", json!(id)), patch)
        .await
        .map_err(|e| db_not_found(e, "Note not found"))?;
    Ok(Json(json!({ "note": note })))
}

/// DELETE /api/notes/:id
pub async fn remove(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    fetch_owned(&user, id).await?;

    repo()?.delete(FilterMap::new().eq("id", json!(id))).await?;
    Ok(Json(json!({ "message": "Note deleted" })))
}
