//! Request handlers for the relayer API.

pub mod orders;
pub mod run;

use axum::Json;
use serde_json::{json, Value};

/// Handles GET /health.
pub async fn handle_health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}
