//! 모의 트래픽 API 핸들러.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use super::ingest::{parse_body, OkResponse};
use crate::error::ApiError;
use crate::mock::clamp_users;
use crate::AppState;

fn app_id_of(body: &Value) -> Result<String, ApiError> {
    body.get("appId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(ApiError::missing_app_id)
}

fn users_of(body: &Value) -> Option<i64> {
    match body.get("users")? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// POST /api/mock/start `{appId, users?}`
pub async fn start_mock(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OkResponse>, ApiError> {
    let body = parse_body(&body)?;
    let app_id = app_id_of(&body)?;
    state
        .mock
        .start(state.store.clone(), &app_id, clamp_users(users_of(&body)));
    Ok(OkResponse::ok())
}

/// POST /api/mock/stop `{appId}`
pub async fn stop_mock(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OkResponse>, ApiError> {
    let body = parse_body(&body)?;
    let app_id = app_id_of(&body)?;
    state.mock.stop(&app_id);
    Ok(OkResponse::ok())
}
