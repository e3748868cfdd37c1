//! 네트워크 카운터 소스 포트.
//!
//! 구현: `traffic-monitor` crate (/proc, sysinfo)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::traffic::CounterSnapshot;

/// 현재 프로세스의 누적 수신/송신 바이트 카운터
#[async_trait]
pub trait CounterSource: Send + Sync {
    /// 현재 누적값 샘플링
    async fn sample(&self) -> Result<CounterSnapshot, CoreError>;

    /// 로그용 소스 이름
    fn name(&self) -> &'static str;
}
