//! 수집 엔드포인트 포트.
//!
//! 구현: `traffic-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::outcome::ReportOutcome;
use crate::models::traffic::ReportRecord;

/// 리포트 레코드 1건을 수집 엔드포인트에 전송
#[async_trait]
pub trait IngestClient: Send + Sync {
    /// `POST {base_url}/api/ingest`
    ///
    /// 2xx 이외 응답은 `CoreError::HttpStatus`, 전송 실패는 `CoreError::Network`.
    async fn send_report(&self, base_url: &str, record: &ReportRecord) -> Result<(), CoreError>;
}

/// 전송 결과 관찰자
///
/// 디스패치 워커에서 호출되므로 블로킹하지 않아야 한다.
pub trait ReportObserver: Send + Sync {
    fn on_outcome(&self, outcome: &ReportOutcome);
}
