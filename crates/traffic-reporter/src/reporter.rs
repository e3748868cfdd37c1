//! 카운터 리포터.
//!
//! 초기화 → (수동 리포트 | 주기 샘플링) → 디스패처 흐름을 담당한다.
//!
//! 동기화 지점:
//! - 자동 리포트 시작/중지는 `auto` 뮤텍스 하나로 직렬화한다.
//! - 기준값(baseline)은 샘플링 동안 async 뮤텍스를 잡아, 타이머 틱과
//!   수동 틱이 서로 끼어들지 않는다.

use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use traffic_core::error::CoreError;
use traffic_core::models::outcome::{DropReason, ReportOutcome};
use traffic_core::models::traffic::{CounterSnapshot, ReportRecord, TrafficDelta};
use traffic_core::ports::counter::CounterSource;
use traffic_core::ports::identity::IdentityProvider;
use traffic_network::dispatcher::{DispatchStats, ReportDispatcher};

/// 기기 식별자도 없을 때 쓰는 사용자 ID
pub const UNKNOWN_USER_ID: &str = "unknown";

/// 초기화 시 설정되는 세션 식별 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// 애플리케이션 ID
    pub app_id: String,
    /// 끝 슬래시가 제거된 수집 서버 주소
    pub base_url: String,
}

/// 샘플링 틱 1회의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 델타가 있어 리포트를 제출하고 기준값을 갱신함
    Reported(TrafficDelta),
    /// 델타 없음, 기준값 유지
    Idle,
    /// 기준값이 없어 이번 샘플을 기준값으로 저장함
    Baselined,
    /// 초기화 전
    NotInitialized,
    /// 카운터 소스 읽기 실패, 기준값 유지
    SampleFailed,
}

/// 실행 중인 자동 리포트 태스크
struct AutoReport {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct Inner {
    session: RwLock<Option<Session>>,
    baseline: tokio::sync::Mutex<Option<CounterSnapshot>>,
    auto: Mutex<Option<AutoReport>>,
    source: Arc<dyn CounterSource>,
    identity: Arc<dyn IdentityProvider>,
    dispatcher: ReportDispatcher,
}

/// 프로세스 네트워크 카운터 리포터
///
/// 복제 비용이 낮은 핸들이다. 모든 복제본은 같은 세션과 타이머를 공유한다.
#[derive(Clone)]
pub struct CounterReporter {
    inner: Arc<Inner>,
}

impl CounterReporter {
    /// 새 리포터 생성 (초기화 전 상태)
    pub fn new(
        source: Arc<dyn CounterSource>,
        identity: Arc<dyn IdentityProvider>,
        dispatcher: ReportDispatcher,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session: RwLock::new(None),
                baseline: tokio::sync::Mutex::new(None),
                auto: Mutex::new(None),
                source,
                identity,
                dispatcher,
            }),
        }
    }

    /// 세션 설정 및 카운터 기준값 샘플링
    ///
    /// 다시 호출하면 세션을 교체하고 기준값을 새로 잡는다.
    /// 기준값 샘플링 실패는 경고만 남기고, 다음 틱에서 기준값을 잡는다.
    pub async fn initialize(&self, app_id: &str, base_url: &str) -> Result<(), CoreError> {
        let app_id = app_id.trim();
        if app_id.is_empty() {
            return Err(CoreError::validation("app_id", "비어 있음"));
        }
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(CoreError::validation("base_url", "비어 있음"));
        }

        *self.inner.session.write() = Some(Session {
            app_id: app_id.to_string(),
            base_url: base_url.to_string(),
        });
        info!("트래픽 리포터 초기화: app_id={app_id}, endpoint={base_url}");

        let mut baseline = self.inner.baseline.lock().await;
        match self.inner.source.sample().await {
            Ok(snapshot) => {
                debug!(
                    "기준값 설정: rx={} tx={}",
                    snapshot.rx_bytes, snapshot.tx_bytes
                );
                *baseline = Some(snapshot);
            }
            Err(e) => {
                warn!("기준값 샘플링 실패 ({}): {e}", self.inner.source.name());
                *baseline = None;
            }
        }
        Ok(())
    }

    /// 리포트 1건 제출 (논블로킹)
    ///
    /// `user_id`가 없으면 기기 식별자를 사용한다. 초기화 전이면 폐기한다.
    /// 결과는 호출자에게 돌아오지 않고 옵저버/통계로만 관찰된다.
    pub fn report_once(&self, user_id: Option<&str>, bytes_in: u64, bytes_out: u64) {
        self.inner
            .report_once(user_id, TrafficDelta::new(bytes_in, bytes_out));
    }

    /// 자동 리포트 시작
    ///
    /// 첫 틱은 `interval` 후. 이미 실행 중이면 아무것도 하지 않고 `Ok(false)`.
    pub fn start_periodic_reporting(&self, interval: Duration) -> Result<bool, CoreError> {
        if interval.is_zero() {
            return Err(CoreError::validation("interval", "0보다 커야 함"));
        }

        let mut auto = self.inner.auto.lock();
        if auto.as_ref().is_some_and(|a| !a.handle.is_finished()) {
            debug!("자동 리포트 이미 실행 중");
            return Ok(false);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_periodic(
            Arc::downgrade(&self.inner),
            interval,
            stop_rx,
        ));
        *auto = Some(AutoReport { stop_tx, handle });

        info!("자동 리포트 시작: {}초 주기", interval.as_secs_f64());
        Ok(true)
    }

    /// 자동 리포트 중지
    ///
    /// 실행 중이 아니면 `false`. 이미 제출된 리포트 전송은 취소하지 않는다.
    pub fn stop_periodic_reporting(&self) -> bool {
        let Some(auto) = self.inner.auto.lock().take() else {
            return false;
        };
        let _ = auto.stop_tx.send(true);
        info!("자동 리포트 중지");
        true
    }

    /// 자동 리포트 실행 여부
    pub fn is_running(&self) -> bool {
        self.inner
            .auto
            .lock()
            .as_ref()
            .is_some_and(|a| !a.handle.is_finished())
    }

    /// 샘플링 틱 1회 즉시 실행
    pub async fn sample_and_report(&self) -> TickOutcome {
        self.inner.sample_and_report().await
    }

    /// 현재 세션 (초기화 전이면 `None`)
    pub fn session(&self) -> Option<Session> {
        self.inner.session.read().clone()
    }

    /// 현재 카운터 기준값
    pub async fn baseline(&self) -> Option<CounterSnapshot> {
        *self.inner.baseline.lock().await
    }

    /// 디스패처 통계
    pub fn stats(&self) -> DispatchStats {
        self.inner.dispatcher.stats()
    }

    /// 자동 리포트를 멈추고 대기 중인 리포트를 `grace` 동안 전송
    pub async fn shutdown(&self, grace: Duration) {
        self.stop_periodic_reporting();
        self.inner.dispatcher.shutdown(grace).await;
    }
}

impl Inner {
    fn report_once(&self, user_id: Option<&str>, delta: TrafficDelta) {
        let Some(session) = self.session.read().clone() else {
            warn!("트래픽 리포터가 초기화되지 않음, 리포트 무시");
            self.dispatcher.notify(ReportOutcome::Dropped {
                record: None,
                reason: DropReason::NotInitialized,
            });
            return;
        };

        let user_id = match user_id {
            Some(id) => id.to_string(),
            None => self.default_user_id(),
        };
        let record = ReportRecord::now(&session.app_id, &user_id, delta);
        self.dispatcher.submit(&session.base_url, record);
    }

    fn default_user_id(&self) -> String {
        self.identity.default_user_id().unwrap_or_else(|| {
            warn!("기기 식별자 없음, '{UNKNOWN_USER_ID}' 사용");
            UNKNOWN_USER_ID.to_string()
        })
    }

    async fn sample_and_report(&self) -> TickOutcome {
        if self.session.read().is_none() {
            warn!("트래픽 리포터가 초기화되지 않음, 틱 무시");
            return TickOutcome::NotInitialized;
        }

        let mut baseline = self.baseline.lock().await;
        let current = match self.source.sample().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("카운터 샘플링 실패 ({}): {e}", self.source.name());
                return TickOutcome::SampleFailed;
            }
        };

        let Some(prev) = *baseline else {
            *baseline = Some(current);
            return TickOutcome::Baselined;
        };

        let delta = TrafficDelta::between(&prev, &current);
        if !delta.is_empty() {
            self.report_once(None, delta);
            *baseline = Some(current);
            return TickOutcome::Reported(delta);
        }

        if current.regressed_from(&prev) {
            debug!(
                "카운터 감소 감지 (rx {}→{}, tx {}→{}), 기준값 유지",
                prev.rx_bytes, current.rx_bytes, prev.tx_bytes, current.tx_bytes
            );
        }
        TickOutcome::Idle
    }

    /// 기준값이 없을 때만 샘플링
    async fn ensure_baseline(&self) {
        let mut baseline = self.baseline.lock().await;
        if baseline.is_some() {
            return;
        }
        match self.source.sample().await {
            Ok(snapshot) => *baseline = Some(snapshot),
            Err(e) => warn!("기준값 샘플링 실패 ({}): {e}", self.source.name()),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(auto) = self.auto.get_mut().take() {
            let _ = auto.stop_tx.send(true);
        }
    }
}

/// 자동 리포트 루프. 리포터가 해제되면 스스로 종료한다.
async fn run_periodic(inner: Weak<Inner>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    if let Some(inner) = inner.upgrade() {
        inner.ensure_baseline().await;
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let outcome = inner.sample_and_report().await;
                debug!("자동 리포트 틱: {outcome:?}");
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
    debug!("자동 리포트 루프 종료");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::mpsc;
    use traffic_core::ports::ingest::IngestClient;
    use traffic_network::dispatcher::ChannelObserver;

    const GRACE: Duration = Duration::from_secs(1);

    /// 미리 정한 값을 차례로 돌려주고, 소진되면 마지막 값을 반복
    struct ScriptedSource {
        samples: Mutex<VecDeque<Result<CounterSnapshot, String>>>,
        last: Mutex<CounterSnapshot>,
    }

    impl ScriptedSource {
        fn new(samples: &[(u64, u64)]) -> Arc<Self> {
            Self::with_results(
                samples
                    .iter()
                    .map(|&(rx, tx)| Ok(CounterSnapshot::new(rx, tx)))
                    .collect(),
            )
        }

        fn with_results(samples: Vec<Result<CounterSnapshot, String>>) -> Arc<Self> {
            Arc::new(Self {
                samples: Mutex::new(samples.into()),
                last: Mutex::new(CounterSnapshot::default()),
            })
        }
    }

    #[async_trait]
    impl CounterSource for ScriptedSource {
        async fn sample(&self) -> Result<CounterSnapshot, CoreError> {
            match self.samples.lock().pop_front() {
                Some(Ok(snapshot)) => {
                    *self.last.lock() = snapshot;
                    Ok(snapshot)
                }
                Some(Err(msg)) => Err(CoreError::CounterSource(msg)),
                None => Ok(*self.last.lock()),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    /// 샘플마다 양쪽 카운터가 100씩 증가
    struct GrowingSource {
        next: Mutex<u64>,
    }

    #[async_trait]
    impl CounterSource for GrowingSource {
        async fn sample(&self) -> Result<CounterSnapshot, CoreError> {
            let mut next = self.next.lock();
            *next += 100;
            Ok(CounterSnapshot::new(*next, *next))
        }

        fn name(&self) -> &'static str {
            "growing"
        }
    }

    struct FixedIdentity(Option<&'static str>);

    impl IdentityProvider for FixedIdentity {
        fn default_user_id(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[derive(Default)]
    struct RecordingClient {
        sent: Mutex<Vec<(String, ReportRecord)>>,
    }

    impl RecordingClient {
        fn records(&self) -> Vec<ReportRecord> {
            self.sent.lock().iter().map(|(_, r)| r.clone()).collect()
        }
    }

    #[async_trait]
    impl IngestClient for RecordingClient {
        async fn send_report(
            &self,
            base_url: &str,
            record: &ReportRecord,
        ) -> Result<(), CoreError> {
            self.sent
                .lock()
                .push((base_url.to_string(), record.clone()));
            Ok(())
        }
    }

    struct Harness {
        reporter: CounterReporter,
        client: Arc<RecordingClient>,
        outcomes: mpsc::UnboundedReceiver<ReportOutcome>,
    }

    fn harness(source: Arc<dyn CounterSource>, identity: Option<&'static str>) -> Harness {
        let client = Arc::new(RecordingClient::default());
        let (observer, outcomes) = ChannelObserver::channel();
        let dispatcher = ReportDispatcher::spawn(client.clone(), 16, Some(Arc::new(observer)));
        let reporter =
            CounterReporter::new(source, Arc::new(FixedIdentity(identity)), dispatcher);
        Harness {
            reporter,
            client,
            outcomes,
        }
    }

    #[tokio::test]
    async fn report_before_initialize_is_dropped() {
        let mut h = harness(ScriptedSource::new(&[]), Some("DEVICE123"));

        h.reporter.report_once(Some("alice"), 10, 20);

        let outcome = h.outcomes.recv().await.unwrap();
        assert_eq!(
            outcome,
            ReportOutcome::Dropped {
                record: None,
                reason: DropReason::NotInitialized,
            }
        );
        h.reporter.shutdown(GRACE).await;
        assert!(h.client.records().is_empty());
        assert_eq!(h.reporter.stats().dropped, 1);
    }

    #[tokio::test]
    async fn initialize_normalizes_endpoint() {
        let h = harness(ScriptedSource::new(&[(1, 2)]), None);
        h.reporter
            .initialize("demo-app", "http://127.0.0.1:8787/")
            .await
            .unwrap();

        assert_eq!(
            h.reporter.session(),
            Some(Session {
                app_id: "demo-app".to_string(),
                base_url: "http://127.0.0.1:8787".to_string(),
            })
        );
        assert_eq!(h.reporter.baseline().await, Some(CounterSnapshot::new(1, 2)));
    }

    #[tokio::test]
    async fn initialize_rejects_empty_identity() {
        let h = harness(ScriptedSource::new(&[]), None);
        assert!(h.reporter.initialize("", "http://host").await.is_err());
        assert!(h.reporter.initialize("app", " / ").await.is_err());
        assert!(h.reporter.session().is_none());
    }

    #[tokio::test]
    async fn tick_reports_clamped_delta() {
        let mut h = harness(
            ScriptedSource::new(&[(1000, 2000), (1500, 2100)]),
            Some("DEVICE123"),
        );
        h.reporter.initialize("demo-app", "http://ingest").await.unwrap();

        let outcome = h.reporter.sample_and_report().await;
        assert_eq!(outcome, TickOutcome::Reported(TrafficDelta::new(500, 100)));
        assert_eq!(
            h.reporter.baseline().await,
            Some(CounterSnapshot::new(1500, 2100))
        );

        let delivered = h.outcomes.recv().await.unwrap();
        let record = delivered.record().unwrap();
        assert_eq!(record.app_id, "demo-app");
        assert_eq!(record.user_id, "DEVICE123");
        assert_eq!(record.bytes_in, 500);
        assert_eq!(record.bytes_out, 100);

        h.reporter.shutdown(GRACE).await;
        let sent = h.client.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "http://ingest");
    }

    #[tokio::test]
    async fn idle_tick_sends_nothing_and_keeps_baseline() {
        let h = harness(ScriptedSource::new(&[(100, 100), (100, 100)]), None);
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        assert_eq!(h.reporter.sample_and_report().await, TickOutcome::Idle);
        assert_eq!(
            h.reporter.baseline().await,
            Some(CounterSnapshot::new(100, 100))
        );

        h.reporter.shutdown(GRACE).await;
        assert!(h.client.records().is_empty());
        assert_eq!(h.reporter.stats().submitted, 0);
    }

    #[tokio::test]
    async fn idle_tick_does_not_lose_later_increment() {
        let h = harness(
            ScriptedSource::new(&[(100, 100), (100, 100), (150, 100)]),
            None,
        );
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        assert_eq!(h.reporter.sample_and_report().await, TickOutcome::Idle);
        assert_eq!(
            h.reporter.sample_and_report().await,
            TickOutcome::Reported(TrafficDelta::new(50, 0))
        );
    }

    #[tokio::test]
    async fn counter_reset_is_clamped_and_keeps_baseline() {
        let h = harness(
            ScriptedSource::new(&[(5000, 5000), (100, 4000), (5300, 5100)]),
            None,
        );
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        assert_eq!(h.reporter.sample_and_report().await, TickOutcome::Idle);
        assert_eq!(
            h.reporter.baseline().await,
            Some(CounterSnapshot::new(5000, 5000))
        );
        assert_eq!(
            h.reporter.sample_and_report().await,
            TickOutcome::Reported(TrafficDelta::new(300, 100))
        );

        h.reporter.shutdown(GRACE).await;
        let records = h.client.records();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].bytes_in, records[0].bytes_out), (300, 100));
    }

    #[tokio::test]
    async fn partial_reset_reports_only_growing_side() {
        let h = harness(ScriptedSource::new(&[(5000, 5000), (100, 5500)]), None);
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        assert_eq!(
            h.reporter.sample_and_report().await,
            TickOutcome::Reported(TrafficDelta::new(0, 500))
        );
        assert_eq!(
            h.reporter.baseline().await,
            Some(CounterSnapshot::new(100, 5500))
        );
    }

    #[tokio::test]
    async fn report_once_falls_back_to_device_identity() {
        let h = harness(ScriptedSource::new(&[(0, 0)]), Some("DEVICE123"));
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        h.reporter.report_once(None, 1, 2);
        h.reporter.report_once(Some("alice"), 3, 4);
        h.reporter.shutdown(GRACE).await;

        let users: Vec<String> = h.client.records().into_iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec!["DEVICE123".to_string(), "alice".to_string()]);
    }

    #[tokio::test]
    async fn missing_device_identity_uses_unknown() {
        let h = harness(ScriptedSource::new(&[(0, 0)]), None);
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        h.reporter.report_once(None, 1, 1);
        h.reporter.shutdown(GRACE).await;
        assert_eq!(h.client.records()[0].user_id, UNKNOWN_USER_ID);
    }

    #[tokio::test]
    async fn tick_before_initialize_is_noop() {
        let h = harness(ScriptedSource::new(&[(1, 1)]), None);
        assert_eq!(
            h.reporter.sample_and_report().await,
            TickOutcome::NotInitialized
        );
        assert_eq!(h.reporter.baseline().await, None);
    }

    #[tokio::test]
    async fn sample_failure_keeps_baseline() {
        let source = ScriptedSource::with_results(vec![
            Ok(CounterSnapshot::new(10, 10)),
            Err("proc unavailable".to_string()),
            Ok(CounterSnapshot::new(20, 10)),
        ]);
        let h = harness(source, None);
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        assert_eq!(h.reporter.sample_and_report().await, TickOutcome::SampleFailed);
        assert_eq!(h.reporter.baseline().await, Some(CounterSnapshot::new(10, 10)));
        assert_eq!(
            h.reporter.sample_and_report().await,
            TickOutcome::Reported(TrafficDelta::new(10, 0))
        );
    }

    #[tokio::test]
    async fn failed_initial_sample_is_baselined_on_first_tick() {
        let source = ScriptedSource::with_results(vec![
            Err("not yet".to_string()),
            Ok(CounterSnapshot::new(7, 7)),
        ]);
        let h = harness(source, None);
        h.reporter.initialize("app", "http://ingest").await.unwrap();
        assert_eq!(h.reporter.baseline().await, None);

        assert_eq!(h.reporter.sample_and_report().await, TickOutcome::Baselined);
        assert_eq!(h.reporter.baseline().await, Some(CounterSnapshot::new(7, 7)));
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let h = harness(ScriptedSource::new(&[]), None);
        assert!(h.reporter.start_periodic_reporting(Duration::ZERO).is_err());
        assert!(!h.reporter.is_running());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let h = harness(ScriptedSource::new(&[(0, 0)]), None);

        assert!(!h.reporter.stop_periodic_reporting());
        assert!(!h.reporter.is_running());

        assert!(h
            .reporter
            .start_periodic_reporting(Duration::from_secs(10))
            .unwrap());
        assert!(h.reporter.is_running());
        assert!(h.reporter.stop_periodic_reporting());
        assert!(!h.reporter.stop_periodic_reporting());
        assert!(!h.reporter.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_runs_one_timer() {
        let source = Arc::new(GrowingSource {
            next: Mutex::new(0),
        });
        let h = harness(source, Some("DEVICE123"));
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        let period = Duration::from_secs(10);
        assert!(h.reporter.start_periodic_reporting(period).unwrap());
        assert!(!h.reporter.start_periodic_reporting(period).unwrap());

        tokio::time::sleep(period + Duration::from_millis(500)).await;
        h.reporter.shutdown(GRACE).await;

        let records = h.client.records();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].bytes_in, records[0].bytes_out), (100, 100));
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_interval() {
        let source = Arc::new(GrowingSource {
            next: Mutex::new(0),
        });
        let h = harness(source, None);
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        let period = Duration::from_secs(10);
        h.reporter.start_periodic_reporting(period).unwrap();
        tokio::time::sleep(period - Duration::from_millis(500)).await;
        assert_eq!(h.reporter.stats().submitted, 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.reporter.stats().submitted, 1);
        h.reporter.shutdown(GRACE).await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_timer_sends_no_more_reports() {
        let source = Arc::new(GrowingSource {
            next: Mutex::new(0),
        });
        let h = harness(source, None);
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        let period = Duration::from_secs(10);
        h.reporter.start_periodic_reporting(period).unwrap();
        tokio::time::sleep(period + Duration::from_millis(500)).await;
        assert!(h.reporter.stop_periodic_reporting());

        tokio::time::sleep(period * 3).await;
        h.reporter.shutdown(GRACE).await;
        assert_eq!(h.client.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_resumes_reporting() {
        let source = Arc::new(GrowingSource {
            next: Mutex::new(0),
        });
        let h = harness(source, None);
        h.reporter.initialize("app", "http://ingest").await.unwrap();

        let period = Duration::from_secs(5);
        h.reporter.start_periodic_reporting(period).unwrap();
        h.reporter.stop_periodic_reporting();
        assert!(h.reporter.start_periodic_reporting(period).unwrap());

        tokio::time::sleep(period * 2 + Duration::from_millis(500)).await;
        h.reporter.shutdown(GRACE).await;
        assert_eq!(h.client.records().len(), 2);
    }
}
