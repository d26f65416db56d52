use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "portfolio-api"
    }))
}

/// GET /api
pub async fn api_root_handler() -> Json<Value> {
    Json(json!({ "status": "API is running" }))
}
