use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

/// GET /api/health - liveness check
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "OK",
            "timestamp": chrono::Utc::now(),
        })),
    )
}
