//! Appointment resource router. Ownership is transitive: an appointment is
//! the caller's only if its parent is. Check-then-mutate runs as two round
//! trips; a row deleted in between just turns into a 404.

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
use crate::database::models::Appointment;
use crate::error::{db_not_found, ApiError};
use crate::middleware::AuthUser;
use crate::validation::Validator;

fn repo() -> Result<Repository<Appointment>, ApiError> {
    Ok(Repository::new("appointments", DatabaseManager::pool()?)?)
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found("Appointment not found"))
}

/// Fetch the appointment, then its parent scoped to the caller. Either miss
/// reports the same 404.
async fn fetch_owned(user: &AuthUser, id: Uuid) -> Result<Appointment, ApiError> {
    let appointment = repo()?
        .select_one(FilterMap::new().eq("id", json!(id)))
        .await
        .map_err(|e| db_not_found(e, "Appointment not found"))?;

    assert_parent_owned(user, appointment.parent_id)
        .await
        .map_err(|e| remap_not_found(e, "Appointment not found"))?;

    Ok(appointment)
}

/// GET /api/appointments - every appointment across the caller's parents
pub async fn list(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let parent_ids = owned_parent_ids(&user).await?;
    if parent_ids.is_empty() {
        // `IN ()` is not valid SQL; nothing to look up anyway
        return Ok(Json(json!({ "appointments": [] })));
    }

    let appointments = repo()?
        .select_many(
            FilterMap::new().is_in("parent_id", parent_ids),
            SelectOptions::order_desc("date"),
        )
        .await?;
    Ok(Json(json!({ "appointments": appointments })))
}

/// GET /api/appointments/parent/:parentId
pub async fn list_for_parent(
    Extension(user): Extension<AuthUser>,
    Path(parent_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let parent_id =
        Uuid::parse_str(&parent_id).map_err(|_| ApiError::not_found("Parent not found"))?;
    assert_parent_owned(&user, parent_id).await?;

    let appointments = repo()?
        .select_many(
            FilterMap::new().eq("parent_id", json!(parent_id)),
            SelectOptions::order_desc("date"),
        )
        .await?;
    Ok(Json(json!({ "appointments": appointments })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub parent_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub doctor: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub follow_up_needed: Option<bool>,
}

/// POST /api/appointments - new appointments always start uncompleted
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.require("parentId", payload.parent_id.as_deref());
    v.check_uuid("parentId", payload.parent_id.as_deref());
    v.require("date", payload.date.as_deref());
    v.check_date("date", payload.date.as_deref());
    v.require("time", payload.time.as_deref());
    v.check_time("time", payload.time.as_deref());
    v.require("doctor", payload.doctor.as_deref());
    v.finish()?;

    let parent_id = Uuid::parse_str(payload.parent_id.unwrap_or_default().trim())
        .map_err(|_| ApiError::not_found("Parent not found"))?;
    assert_parent_owned(&user, parent_id).await?;

    let mut row = Map::new();
    row.insert("parent_id".to_string(), json!(parent_id));
    row.insert("date".to_string(), json!(payload.date.unwrap_or_default()));
    row.insert("time".to_string(), json!(payload.time.unwrap_or_default()));
    row.insert(
        "doctor".to_string(),
        json!(payload.doctor.unwrap_or_default().trim()),
    );
    if let Some(specialty) = payload.specialty {
        row.insert("specialty".to_string(), json!(specialty));
    }
    if let Some(location) = payload.location {
        row.insert("location".to_string(), json!(location));
    }
    if let Some(reason) = payload.reason {
        row.insert("reason".to_string(), json!(reason));
    }
    if let Some(notes) = payload.notes {
        row.insert("notes".to_string(), json!(notes));
    }
    row.insert("completed".to_string(), json!(false));
    row.insert(
        "follow_up_needed".to_string(),
        json!(payload.follow_up_needed.unwrap_or(false)),
    );

    let appointment = repo()?.insert(row).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "appointment": appointment })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub doctor: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
    pub follow_up_needed: Option<bool>,
}

/// PUT /api/appointments/:id - partial update over the allow-listed fields
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;

    let mut v = Validator::new();
    v.check_date("date", payload.date.as_deref());
    v.check_time("time", payload.time.as_deref());
    v.check_not_blank("doctor", payload.doctor.as_deref());
    v.finish()?;

    fetch_owned(&user, id).await?;

    let mut patch = Map::new();
    if let Some(date) = payload.date {
        patch.insert("date".to_string(), json!(date));
    }
    if let Some(time) = payload.time {
        patch.insert("time".to_string(), json!(time));
    }
    if let Some(doctor) = payload.doctor {
        patch.insert("doctor".to_string(), json!(doctor.trim()));
    }
    if let Some(specialty) = payload.specialty {
        patch.insert("specialty".to_string(), json!(specialty));
    }
    if let Some(location) = payload.location {
        patch.insert("location".to_string(), json!(location));
    }
    if let Some(reason) = payload.reason {
        patch.insert("reason".to_string(), json!(reason));
    }
    if let Some(notes) = payload.notes {
        patch.insert("notes".to_string(), json!(notes));
    }
    if let Some(completed) = payload.completed {
        patch.insert("completed".to_string(), json!(completed));
    }
    if let Some(follow_up) = payload.follow_up_needed {
        patch.insert("follow_up_needed".to_string(), json!(follow_up));
    }

    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let appointment = repo()?
        .update(FilterMap::new().eq("id", json!(id)), patch)
        .await
        .map_err(|e| db_not_found(e, "Appointment not found"))?;
    Ok(Json(json!({ "appointment": appointment })))
}

/// DELETE /api/appointments/:id
pub async fn remove(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    fetch_owned(&user, id).await?;

    repo()?.delete(FilterMap::new().eq("id", json!(id))).await?;
    Ok(Json(json!({ "message": "Appointment deleted" })))
}
