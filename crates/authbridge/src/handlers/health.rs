//! Health check endpoints.
//!
//! - `/livez` - Basic liveness check (immediate 200, no checks)
//! - `/healthz` - Configured providers

use authbridge_auth::AuthState;
use axum::{extract::State, http::StatusCode, Json};

/// GET /livez - Basic liveness check.
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Reports the providers this instance serves.
pub async fn healthz(State(state): State<AuthState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "providers": state.provider_ids(),
    }))
}
