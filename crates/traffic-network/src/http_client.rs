//! 수집 엔드포인트 HTTP 클라이언트.
//!
//! `IngestClient` 포트 구현. 재시도 없이 1회 전송하고 상태 코드만 확인한다.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;
use traffic_core::error::CoreError;
use traffic_core::models::traffic::ReportRecord;
use traffic_core::ports::ingest::IngestClient;

/// 수집 API 경로
pub const INGEST_PATH: &str = "/api/ingest";

/// 요청 Content-Type
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// 기본 연결/읽기 타임아웃
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// `{base_url}/api/ingest` URL 생성 (끝 슬래시 제거)
pub fn ingest_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), INGEST_PATH)
}

/// reqwest 기반 수집 클라이언트: `IngestClient` 포트 구현
pub struct HttpIngestClient {
    client: reqwest::Client,
}

impl HttpIngestClient {
    /// 연결 타임아웃과 요청 전체 타임아웃을 지정하여 생성
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl IngestClient for HttpIngestClient {
    async fn send_report(&self, base_url: &str, record: &ReportRecord) -> Result<(), CoreError> {
        let url = ingest_url(base_url);
        let body = serde_json::to_vec(record)?;

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("리포트 전송 실패: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::HttpStatus {
                status: status.as_u16(),
            });
        }

        debug!(
            "리포트 전송 성공: {}/{} → {url}",
            record.bytes_in, record.bytes_out
        );
        Ok(())
    }
}
