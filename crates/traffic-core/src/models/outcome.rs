//! 리포트 전송 결과.
//!
//! 호출자에게 에러를 전파하지 않는 대신, 모든 전송 시도는
//! 정확히 하나의 [`ReportOutcome`]으로 끝나며 옵저버로 전달된다.

use serde::{Deserialize, Serialize};

use crate::models::traffic::ReportRecord;

/// 전송 전 폐기 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// 리포터 초기화 전
    NotInitialized,
    /// 디스패치 큐 가득 참
    QueueFull,
    /// 디스패처 종료됨
    Closed,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::NotInitialized => write!(f, "not_initialized"),
            DropReason::QueueFull => write!(f, "queue_full"),
            DropReason::Closed => write!(f, "closed"),
        }
    }
}

/// 리포트 1건의 최종 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// 2xx 응답
    Delivered(ReportRecord),
    /// 2xx 이외 응답
    Rejected { record: ReportRecord, status: u16 },
    /// 연결 실패, 타임아웃 등
    Failed { record: ReportRecord, reason: String },
    /// 전송 시도 없이 폐기
    Dropped {
        record: Option<ReportRecord>,
        reason: DropReason,
    },
}

impl ReportOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ReportOutcome::Delivered(_))
    }

    /// 결과에 연결된 레코드 (초기화 전 폐기는 레코드 없음)
    pub fn record(&self) -> Option<&ReportRecord> {
        match self {
            ReportOutcome::Delivered(record)
            | ReportOutcome::Rejected { record, .. }
            | ReportOutcome::Failed { record, .. } => Some(record),
            ReportOutcome::Dropped { record, .. } => record.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ReportRecord {
        ReportRecord {
            app_id: "a".to_string(),
            user_id: "u".to_string(),
            bytes_in: 1,
            bytes_out: 1,
            ts: 0,
        }
    }

    #[test]
    fn outcome_record_access() {
        assert!(ReportOutcome::Delivered(record()).is_delivered());
        assert_eq!(
            ReportOutcome::Rejected {
                record: record(),
                status: 500
            }
            .record()
            .map(|r| r.app_id.as_str()),
            Some("a")
        );
        let dropped = ReportOutcome::Dropped {
            record: None,
            reason: DropReason::NotInitialized,
        };
        assert!(dropped.record().is_none());
        assert!(!dropped.is_delivered());
    }

    #[test]
    fn drop_reason_display() {
        assert_eq!(DropReason::QueueFull.to_string(), "queue_full");
    }
}
