//! 트래픽 수집 API 핸들러.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use traffic_core::error::CoreError;

use super::now_ms;
use crate::error::ApiError;
use crate::store::IngestEvent;
use crate::AppState;

/// 성공 응답
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

/// POST /api/ingest
///
/// 본문 `{appId, userId, bytesIn?, bytesOut?, ts?}`. 빈 본문은 `{}`로 취급한다.
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OkResponse>, ApiError> {
    let value = parse_body(&body)?;
    let now = now_ms();
    let event = parse_event(&value, now)?;
    debug!(
        "수집: app_id={}, user_id={}, in={}, out={}",
        event.app_id, event.user_id, event.bytes_in, event.bytes_out
    );
    state.store.ingest(&event, now);
    Ok(OkResponse::ok())
}

/// JSON 본문 파싱. 공백뿐인 본문은 빈 객체.
pub(crate) fn parse_body(body: &[u8]) -> Result<Value, CoreError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_slice(body)?)
}

/// 수집 이벤트 추출
///
/// - `appId`, `userId`: 필수. 참인 값만 받고 문자열로 변환한다 (`0`, `false`는 누락).
/// - `bytesIn`, `bytesOut`: 숫자가 아니거나 음수면 0.
/// - `ts`: 숫자가 아니면 `now`.
pub(crate) fn parse_event(value: &Value, now: i64) -> Result<IngestEvent, CoreError> {
    let app_id = id_field(value.get("appId"))
        .ok_or_else(|| CoreError::validation("appId", "appId와 userId는 필수"))?;
    let user_id = id_field(value.get("userId"))
        .ok_or_else(|| CoreError::validation("userId", "appId와 userId는 필수"))?;

    let ts = value
        .get("ts")
        .and_then(Value::as_f64)
        .filter(|t| t.is_finite())
        .map_or(now, |t| t as i64);

    Ok(IngestEvent {
        app_id,
        user_id,
        bytes_in: byte_field(value.get("bytesIn")),
        bytes_out: byte_field(value.get("bytesOut")),
        ts,
    })
}

/// 식별자 필드. 참(truthy)인 값만 받아 문자열로 변환한다.
///
/// 빈 문자열, `0`, `false`, `null`은 누락으로 본다.
fn id_field(value: Option<&Value>) -> Option<String> {
    let value = value?;
    let truthy = match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    truthy.then(|| display_string(value))
}

/// 자바스크립트 `String(value)`와 같은 문자열 표현
fn display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if n.is_f64() {
                match n.as_f64() {
                    // 정수값 실수는 소수점 없이 (42.0 → "42")
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
                    _ => n.to_string(),
                }
            } else {
                n.to_string()
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn byte_field(value: Option<&Value>) -> u64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n as u64
    } else {
        0
    }
}
