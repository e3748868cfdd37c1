//! Cross-crate 에러 경로 테스트.
//!
//! 서버 거부, 연결 실패, 잘못된 설정이 크레이트 경계를 넘어 어떻게 드러나는지 검증한다.

use std::sync::Arc;
use std::time::Duration;
use traffic_core::config_manager::ConfigManager;
use traffic_core::error::CoreError;
use traffic_core::models::outcome::{DropReason, ReportOutcome};
use traffic_monitor::StaticIdentityProvider;
use traffic_network::dispatcher::{ChannelObserver, ReportDispatcher};
use traffic_network::http_client::HttpIngestClient;
use traffic_reporter::CounterReporter;

const GRACE: Duration = Duration::from_secs(5);

fn reporter_with_interfaces() -> (
    CounterReporter,
    tokio::sync::mpsc::UnboundedReceiver<ReportOutcome>,
) {
    let source = Arc::new(traffic_monitor::InterfaceCounterSource::new(false));
    let client = HttpIngestClient::new(Duration::from_millis(500)).unwrap();
    let (observer, outcomes) = ChannelObserver::channel();
    let dispatcher = ReportDispatcher::spawn(Arc::new(client), 4, Some(Arc::new(observer)));
    let reporter = CounterReporter::new(
        source,
        Arc::new(StaticIdentityProvider::new("DEVICE123")),
        dispatcher,
    );
    (reporter, outcomes)
}

#[tokio::test]
async fn server_error_is_rejected_outcome() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/ingest")
        .with_status(503)
        .create_async()
        .await;

    let (reporter, mut outcomes) = reporter_with_interfaces();
    reporter.initialize("shop", &server.url()).await.unwrap();
    reporter.report_once(None, 1, 2);

    let outcome = tokio::time::timeout(GRACE, outcomes.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, ReportOutcome::Rejected { status: 503, .. }));
    mock.assert_async().await;

    reporter.shutdown(GRACE).await;
    let stats = reporter.stats();
    assert_eq!((stats.rejected, stats.delivered), (1, 0));
}

#[tokio::test]
async fn unreachable_server_is_failed_outcome() {
    let (reporter, mut outcomes) = reporter_with_interfaces();
    // 포트 1은 열려 있지 않다
    reporter
        .initialize("shop", "http://127.0.0.1:1")
        .await
        .unwrap();
    reporter.report_once(Some("alice"), 1, 1);

    let outcome = tokio::time::timeout(GRACE, outcomes.recv())
        .await
        .unwrap()
        .unwrap();
    match outcome {
        ReportOutcome::Failed { record, .. } => assert_eq!(record.user_id, "alice"),
        other => panic!("예상하지 못한 결과: {other:?}"),
    }
    reporter.shutdown(GRACE).await;
}

#[tokio::test]
async fn report_before_initialize_never_hits_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/ingest")
        .expect(0)
        .create_async()
        .await;

    let (reporter, mut outcomes) = reporter_with_interfaces();
    reporter.report_once(None, 5, 5);

    let outcome = outcomes.recv().await.unwrap();
    assert_eq!(
        outcome,
        ReportOutcome::Dropped {
            record: None,
            reason: DropReason::NotInitialized,
        }
    );
    reporter.shutdown(GRACE).await;
    mock.assert_async().await;
}

#[tokio::test]
async fn report_after_shutdown_is_dropped() {
    let (reporter, mut outcomes) = reporter_with_interfaces();
    reporter
        .initialize("shop", "http://127.0.0.1:1")
        .await
        .unwrap();
    reporter.shutdown(GRACE).await;

    reporter.report_once(None, 1, 1);
    let outcome = outcomes.recv().await.unwrap();
    assert!(matches!(
        outcome,
        ReportOutcome::Dropped {
            reason: DropReason::Closed,
            ..
        }
    ));
}

#[test]
fn invalid_config_file_is_config_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"reporter":{"interval_secs":0}}"#).unwrap();

    let err = ConfigManager::with_path(path).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation { .. } | CoreError::Config(_)
    ));
}
