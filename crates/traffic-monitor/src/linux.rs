//! Linux 플랫폼 카운터 소스.
//!
//! `/proc/self/net/dev`는 현재 프로세스가 속한 네트워크 네임스페이스의
//! 인터페이스별 누적 카운터를 노출한다. 컨테이너/네임스페이스 단위로 격리된
//! 프로세스라면 사실상 프로세스 단위 트래픽이 된다.
//!
//! 형식:
//! ```text
//! Inter-|   Receive                                                |  Transmit
//!  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets ...
//!     lo:    1234      10    0    0    0     0          0         0     1234      10 ...
//!   eth0: 9876543    7000    0    0    0     0          0         0   123456     900 ...
//! ```

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use traffic_core::error::CoreError;
use traffic_core::models::traffic::CounterSnapshot;
use traffic_core::ports::counter::CounterSource;

use crate::counter::is_loopback;

const PROC_NET_DEV: &str = "/proc/self/net/dev";

/// 수신 바이트 컬럼 (콜론 뒤 0번째)
const RX_BYTES_FIELD: usize = 0;
/// 송신 바이트 컬럼 (콜론 뒤 8번째)
const TX_BYTES_FIELD: usize = 8;

/// `/proc/self/net/dev` 카운터 소스
pub struct ProcNetDevSource {
    path: PathBuf,
    include_loopback: bool,
}

impl ProcNetDevSource {
    pub fn new(include_loopback: bool) -> Self {
        Self::with_path(PROC_NET_DEV, include_loopback)
    }

    /// 다른 경로의 net/dev 형식 파일 사용 (테스트, 다른 PID 조회)
    pub fn with_path(path: impl Into<PathBuf>, include_loopback: bool) -> Self {
        Self {
            path: path.into(),
            include_loopback,
        }
    }
}

#[async_trait]
impl CounterSource for ProcNetDevSource {
    async fn sample(&self) -> Result<CounterSnapshot, CoreError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CoreError::CounterSource(format!("{} 읽기 실패: {e}", self.path.display()))
        })?;
        let snapshot = parse_net_dev(&content, self.include_loopback)?;
        debug!(
            "/proc 카운터: rx={} tx={}",
            snapshot.rx_bytes, snapshot.tx_bytes
        );
        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "proc_net_dev"
    }
}

/// net/dev 본문을 파싱하여 인터페이스 합계 반환
pub fn parse_net_dev(content: &str, include_loopback: bool) -> Result<CounterSnapshot, CoreError> {
    let mut total = CounterSnapshot::default();

    // 앞 두 줄은 헤더
    for line in content.lines().skip(2) {
        let Some((iface, counters)) = line.split_once(':') else {
            continue;
        };
        let iface = iface.trim();
        if !include_loopback && is_loopback(iface) {
            continue;
        }

        let fields: Vec<&str> = counters.split_whitespace().collect();
        let rx = parse_field(&fields, RX_BYTES_FIELD, iface)?;
        let tx = parse_field(&fields, TX_BYTES_FIELD, iface)?;

        total.rx_bytes = total.rx_bytes.saturating_add(rx);
        total.tx_bytes = total.tx_bytes.saturating_add(tx);
    }

    Ok(total)
}

fn parse_field(fields: &[&str], index: usize, iface: &str) -> Result<u64, CoreError> {
    let raw = fields.get(index).ok_or_else(|| {
        CoreError::CounterSource(format!("{iface}: 컬럼 {index} 없음"))
    })?;
    raw.parse::<u64>()
        .map_err(|e| CoreError::CounterSource(format!("{iface}: 컬럼 {index} 파싱 실패: {e}")))
}
