//! API 에러 처리.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 잘못된 요청
    #[error("{0}")]
    BadRequest(String),

    /// 등록되지 않은 대상
    #[error("{0}")]
    NotFound(String),

    /// 내부 서버 오류
    #[error("{0}")]
    Internal(String),
}

/// 에러 응답 본문 (`{"ok": false, "error": ...}`)
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ApiError {
    /// `appId` 누락
    pub fn missing_app_id() -> Self {
        ApiError::BadRequest("appId 누락".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            ok: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<traffic_core::error::CoreError> for ApiError {
    fn from(err: traffic_core::error::CoreError) -> Self {
        use traffic_core::error::CoreError;
        match err {
            CoreError::Validation { .. } | CoreError::Serialization(_) => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
