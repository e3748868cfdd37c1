//! API 핸들러 모듈.

pub mod apk;
pub mod apps;
pub mod ingest;
pub mod mock;
pub mod snapshot;
pub mod stream;

use serde::Deserialize;

/// `?appId=` 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct AppQuery {
    #[serde(rename = "appId")]
    pub app_id: Option<String>,
}

impl AppQuery {
    /// 비어 있지 않은 appId
    pub fn require(self) -> Result<String, crate::error::ApiError> {
        self.app_id
            .filter(|id| !id.is_empty())
            .ok_or_else(crate::error::ApiError::missing_app_id)
    }
}

/// 현재 시각 (epoch 밀리초)
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
