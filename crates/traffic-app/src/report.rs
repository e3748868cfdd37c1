//! `report` 명령: 리포터 구성 및 실행.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use traffic_core::config::AppConfig;
use traffic_core::ports::identity::IdentityProvider;
use traffic_monitor::{create_counter_source, MachineIdentityProvider, StaticIdentityProvider};
use traffic_network::dispatcher::ReportDispatcher;
use traffic_network::http_client::HttpIngestClient;
use traffic_reporter::CounterReporter;

use crate::lifecycle::LifecycleManager;

/// 종료 시 대기 중인 리포트 전송 허용 시간
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// 설정으로 리포터 구성 (초기화 전)
pub fn build_reporter(config: &AppConfig) -> Result<CounterReporter> {
    let source = create_counter_source(&config.monitor).context("카운터 소스 생성 실패")?;

    let identity: Arc<dyn IdentityProvider> = match &config.reporter.user_id {
        Some(user_id) => Arc::new(StaticIdentityProvider::new(user_id.clone())),
        None => Arc::new(MachineIdentityProvider::new()),
    };

    let client =
        HttpIngestClient::new(config.request_timeout()).context("HTTP 클라이언트 생성 실패")?;
    let dispatcher = ReportDispatcher::spawn(Arc::new(client), config.reporter.queue_capacity, None);

    Ok(CounterReporter::new(source, identity, dispatcher))
}

/// 종료 신호까지 자동 리포트 실행 후 대기 중인 리포트 전송
pub async fn run(config: AppConfig, lifecycle: &LifecycleManager) -> Result<()> {
    let reporter = build_reporter(&config)?;
    reporter
        .initialize(&config.reporter.app_id, &config.reporter.base_url)
        .await
        .context("리포터 초기화 실패")?;
    reporter
        .start_periodic_reporting(config.report_interval())
        .context("자동 리포트 시작 실패")?;

    lifecycle
        .wait_for_signal()
        .await
        .context("시그널 핸들러 등록 실패")?;

    reporter.shutdown(DRAIN_GRACE).await;
    let stats = reporter.stats();
    info!(
        "리포터 종료: 제출 {}, 성공 {}, 거부 {}, 실패 {}, 폐기 {}",
        stats.submitted, stats.delivered, stats.rejected, stats.failed, stats.dropped
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_core::config::CounterSourceKind;

    #[tokio::test]
    async fn builds_with_interface_source() {
        let mut config = AppConfig::default_config();
        config.monitor.source = CounterSourceKind::Interfaces;
        config.reporter.user_id = Some("fixed".to_string());

        let reporter = build_reporter(&config).unwrap();
        assert!(reporter.session().is_none());
        assert!(!reporter.is_running());
        reporter.shutdown(Duration::from_millis(100)).await;
    }
}
