//! APK 등록/조회 API 핸들러.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::ingest::parse_body;
use super::AppQuery;
use crate::apk::ApkRecord;
use crate::error::ApiError;
use crate::AppState;

/// 단일 APK 응답
#[derive(Debug, Serialize)]
pub struct ApkResponse {
    pub ok: bool,
    pub apk: ApkRecord,
}

/// APK 목록 응답
#[derive(Debug, Serialize)]
pub struct ApkListResponse {
    pub ok: bool,
    pub apks: Vec<ApkRecord>,
}

fn str_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// POST /api/apk/register `{apkPath, appId?}`
pub async fn register_apk(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApkResponse>, ApiError> {
    let body = parse_body(&body)?;
    let apk_path = str_field(&body, "apkPath")
        .ok_or_else(|| ApiError::BadRequest("apkPath 누락".to_string()))?;

    let apk = state
        .apk
        .register(apk_path, str_field(&body, "appId"))
        .await;
    info!("APK 등록: app_id={}, path={}", apk.app_id, apk.apk_path);
    Ok(Json(ApkResponse { ok: true, apk }))
}

/// GET /api/apk/list
pub async fn list_apks(State(state): State<AppState>) -> Json<ApkListResponse> {
    Json(ApkListResponse {
        ok: true,
        apks: state.apk.list(),
    })
}

/// GET /api/apk/info?appId=
pub async fn apk_info(
    State(state): State<AppState>,
    Query(query): Query<AppQuery>,
) -> Result<Json<ApkResponse>, ApiError> {
    let app_id = query.require()?;
    let apk = state
        .apk
        .get(&app_id)
        .ok_or_else(|| ApiError::NotFound("APK 미등록".to_string()))?;
    Ok(Json(ApkResponse { ok: true, apk }))
}
