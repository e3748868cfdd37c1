//! 인터페이스 합계 카운터 소스.
//!
//! `CounterSource` 포트 구현. sysinfo 기반 인터페이스별 누적 바이트 합산.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use sysinfo::Networks;
use tracing::{debug, info};
use traffic_core::config::{CounterSourceKind, MonitorConfig};
use traffic_core::error::CoreError;
use traffic_core::models::traffic::CounterSnapshot;
use traffic_core::ports::counter::CounterSource;

/// 루프백 인터페이스 판별
pub(crate) fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.eq_ignore_ascii_case("loopback")
}

/// sysinfo 기반 카운터 소스: 모든 플랫폼에서 동작
pub struct InterfaceCounterSource {
    networks: Mutex<Networks>,
    include_loopback: bool,
}

impl InterfaceCounterSource {
    pub fn new(include_loopback: bool) -> Self {
        Self {
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            include_loopback,
        }
    }
}

#[async_trait]
impl CounterSource for InterfaceCounterSource {
    async fn sample(&self) -> Result<CounterSnapshot, CoreError> {
        let mut networks = self
            .networks
            .lock()
            .map_err(|e| CoreError::Internal(format!("네트워크 잠금 실패: {e}")))?;
        networks.refresh(true);

        let snapshot = networks
            .list()
            .iter()
            .filter(|(name, _)| self.include_loopback || !is_loopback(name))
            .fold(CounterSnapshot::default(), |acc, (_name, data)| {
                CounterSnapshot::new(
                    acc.rx_bytes.saturating_add(data.total_received()),
                    acc.tx_bytes.saturating_add(data.total_transmitted()),
                )
            });

        debug!(
            "인터페이스 카운터: rx={} tx={}",
            snapshot.rx_bytes, snapshot.tx_bytes
        );
        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "interfaces"
    }
}

/// 설정에 맞는 카운터 소스 생성
///
/// `Auto`는 Linux에서 `/proc/self/net/dev`, 그 외 플랫폼에서 sysinfo를 사용한다.
pub fn create_counter_source(config: &MonitorConfig) -> Result<Arc<dyn CounterSource>, CoreError> {
    let source: Arc<dyn CounterSource> = match config.source {
        CounterSourceKind::Interfaces => {
            Arc::new(InterfaceCounterSource::new(config.include_loopback))
        }
        CounterSourceKind::ProcNetDev => proc_net_dev(config)?,
        CounterSourceKind::Auto => {
            if cfg!(target_os = "linux") {
                proc_net_dev(config)?
            } else {
                Arc::new(InterfaceCounterSource::new(config.include_loopback))
            }
        }
    };
    info!("카운터 소스: {}", source.name());
    Ok(source)
}

#[cfg(target_os = "linux")]
fn proc_net_dev(config: &MonitorConfig) -> Result<Arc<dyn CounterSource>, CoreError> {
    Ok(Arc::new(crate::linux::ProcNetDevSource::new(
        config.include_loopback,
    )))
}

#[cfg(not(target_os = "linux"))]
fn proc_net_dev(_config: &MonitorConfig) -> Result<Arc<dyn CounterSource>, CoreError> {
    Err(CoreError::Config(
        "proc_net_dev 소스는 Linux에서만 지원됩니다".to_string(),
    ))
}
