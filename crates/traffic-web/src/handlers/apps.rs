//! 앱 목록 API 핸들러.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

/// 앱 목록 응답
#[derive(Debug, Serialize)]
pub struct AppsResponse {
    pub ok: bool,
    pub apps: Vec<String>,
}

/// GET /api/apps
pub async fn list_apps(State(state): State<AppState>) -> Json<AppsResponse> {
    Json(AppsResponse {
        ok: true,
        apps: state.store.app_ids(),
    })
}
