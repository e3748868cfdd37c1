//! 카운터 스냅샷, 델타, 리포트 레코드.

use serde::{Deserialize, Serialize};

/// 프로세스 네트워크 누적 카운터 스냅샷 (수신/송신 바이트)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// 누적 수신 바이트
    pub rx_bytes: u64,
    /// 누적 송신 바이트
    pub tx_bytes: u64,
}

impl CounterSnapshot {
    pub fn new(rx_bytes: u64, tx_bytes: u64) -> Self {
        Self { rx_bytes, tx_bytes }
    }

    /// 어느 한쪽 카운터라도 이전 값보다 작아졌는지 (카운터 리셋/랩어라운드)
    pub fn regressed_from(&self, prev: &CounterSnapshot) -> bool {
        self.rx_bytes < prev.rx_bytes || self.tx_bytes < prev.tx_bytes
    }
}

/// 두 스냅샷 사이의 증가량. 음수는 0으로 고정된다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficDelta {
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl TrafficDelta {
    pub fn new(bytes_in: u64, bytes_out: u64) -> Self {
        Self {
            bytes_in,
            bytes_out,
        }
    }

    /// `prev` → `cur` 델타 계산 (saturating)
    pub fn between(prev: &CounterSnapshot, cur: &CounterSnapshot) -> Self {
        Self {
            bytes_in: cur.rx_bytes.saturating_sub(prev.rx_bytes),
            bytes_out: cur.tx_bytes.saturating_sub(prev.tx_bytes),
        }
    }

    /// 양쪽 모두 0인지
    pub fn is_empty(&self) -> bool {
        self.bytes_in == 0 && self.bytes_out == 0
    }
}

/// 수집 엔드포인트로 전송되는 리포트 레코드
///
/// 와이어 포맷: `{"appId", "userId", "bytesIn", "bytesOut", "ts"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    /// 애플리케이션 ID
    pub app_id: String,
    /// 사용자 ID (미지정 시 기기 식별자)
    pub user_id: String,
    /// 수신 바이트 증가량
    pub bytes_in: u64,
    /// 송신 바이트 증가량
    pub bytes_out: u64,
    /// 생성 시각 (epoch 밀리초)
    pub ts: i64,
}

impl ReportRecord {
    /// 현재 시각으로 레코드 생성
    pub fn now(app_id: &str, user_id: &str, delta: TrafficDelta) -> Self {
        Self {
            app_id: app_id.to_string(),
            user_id: user_id.to_string(),
            bytes_in: delta.bytes_in,
            bytes_out: delta.bytes_out,
            ts: chrono::Utc::now().timestamp_millis(),
        }
    }
}
