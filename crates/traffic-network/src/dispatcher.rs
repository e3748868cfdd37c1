//! 리포트 디스패처.
//!
//! 리포트 레코드를 bounded 큐에 넣고 단일 워커 태스크가 순서대로 전송한다.
//! 큐가 가득 차면 호출자를 기다리게 하지 않고 즉시 폐기한다 (재시도/백프레셔 없음).

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use traffic_core::error::CoreError;
use traffic_core::models::outcome::{DropReason, ReportOutcome};
use traffic_core::models::traffic::ReportRecord;
use traffic_core::ports::ingest::{IngestClient, ReportObserver};

/// 큐 항목: 엔드포인트는 제출 시점의 세션 값
struct Dispatch {
    base_url: String,
    record: ReportRecord,
}

/// 결과별 카운터 (lock-free)
#[derive(Debug, Default)]
struct DispatchCounters {
    submitted: AtomicU64,
    delivered: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// 디스패처 통계 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// 큐에 들어간 리포트 수
    pub submitted: u64,
    /// 2xx 응답
    pub delivered: u64,
    /// 2xx 이외 응답
    pub rejected: u64,
    /// 네트워크 에러
    pub failed: u64,
    /// 전송 전 폐기
    pub dropped: u64,
}

/// 결과 카운터 갱신 + 옵저버 호출
struct OutcomeSink {
    counters: DispatchCounters,
    observer: Option<Arc<dyn ReportObserver>>,
}

impl OutcomeSink {
    fn record(&self, outcome: &ReportOutcome) {
        let counter = match outcome {
            ReportOutcome::Delivered(_) => &self.counters.delivered,
            ReportOutcome::Rejected { .. } => &self.counters.rejected,
            ReportOutcome::Failed { .. } => &self.counters.failed,
            ReportOutcome::Dropped { .. } => &self.counters.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Some(observer) = &self.observer {
            observer.on_outcome(outcome);
        }
    }
}

/// 리포트 디스패처: bounded 큐 → 단일 전송 워커
pub struct ReportDispatcher {
    tx: Mutex<Option<mpsc::Sender<Dispatch>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    sink: Arc<OutcomeSink>,
    capacity: usize,
}

impl ReportDispatcher {
    /// 워커 태스크를 띄우고 디스패처 반환
    ///
    /// tokio 런타임 안에서 호출해야 한다. `capacity`가 0이면 1로 올린다.
    pub fn spawn(
        client: Arc<dyn IngestClient>,
        capacity: usize,
        observer: Option<Arc<dyn ReportObserver>>,
    ) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let sink = Arc::new(OutcomeSink {
            counters: DispatchCounters::default(),
            observer,
        });

        let worker = tokio::spawn(run_worker(rx, client, sink.clone()));

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            sink,
            capacity,
        }
    }

    /// 리포트 제출 (논블로킹)
    ///
    /// 큐에 들어가면 `true`. 큐가 가득 찼거나 종료된 경우 `Dropped`로 기록하고 `false`.
    pub fn submit(&self, base_url: &str, record: ReportRecord) -> bool {
        let dispatch = Dispatch {
            base_url: base_url.to_string(),
            record,
        };

        let result = match self.tx.lock().as_ref() {
            Some(tx) => tx.try_send(dispatch),
            None => Err(TrySendError::Closed(dispatch)),
        };

        match result {
            Ok(()) => {
                self.sink.counters.submitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(dispatch)) => {
                warn!("디스패치 큐 가득 참 (용량 {}), 리포트 폐기", self.capacity);
                self.notify(ReportOutcome::Dropped {
                    record: Some(dispatch.record),
                    reason: DropReason::QueueFull,
                });
                false
            }
            Err(TrySendError::Closed(dispatch)) => {
                warn!("디스패처 종료됨, 리포트 폐기");
                self.notify(ReportOutcome::Dropped {
                    record: Some(dispatch.record),
                    reason: DropReason::Closed,
                });
                false
            }
        }
    }

    /// 큐를 거치지 않은 결과 기록 (예: 초기화 전 폐기)
    pub fn notify(&self, outcome: ReportOutcome) {
        self.sink.record(&outcome);
    }

    /// 큐 용량
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> DispatchStats {
        let c = &self.sink.counters;
        DispatchStats {
            submitted: c.submitted.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
        }
    }

    /// 큐를 닫고 남은 리포트 전송을 `grace` 동안 기다린다
    ///
    /// 이후 `submit`은 `Dropped(Closed)`. 여러 번 호출해도 안전하다.
    pub async fn shutdown(&self, grace: Duration) {
        drop(self.tx.lock().take());

        let worker = self.worker.lock().take();
        let Some(mut worker) = worker else {
            return;
        };

        match tokio::time::timeout(grace, &mut worker).await {
            Ok(_) => debug!("디스패치 워커 정상 종료"),
            Err(_) => {
                warn!("디스패치 워커 종료 대기 시간 초과 ({grace:?}), 중단");
                worker.abort();
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Dispatch>,
    client: Arc<dyn IngestClient>,
    sink: Arc<OutcomeSink>,
) {
    while let Some(Dispatch { base_url, record }) = rx.recv().await {
        let outcome = match client.send_report(&base_url, &record).await {
            Ok(()) => {
                debug!("트래픽 리포트 완료: {}/{}", record.bytes_in, record.bytes_out);
                ReportOutcome::Delivered(record)
            }
            Err(CoreError::HttpStatus { status }) => {
                warn!("리포트 거부됨: HTTP {status}");
                ReportOutcome::Rejected { record, status }
            }
            Err(e) => {
                warn!("리포트 에러: {e}");
                ReportOutcome::Failed {
                    record,
                    reason: e.to_string(),
                }
            }
        };
        sink.record(&outcome);
    }
    debug!("디스패치 큐 닫힘, 워커 종료");
}

/// 결과를 채널로 전달하는 옵저버
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ReportOutcome>,
}

impl ChannelObserver {
    /// 옵저버와 수신 채널 생성
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReportOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReportObserver for ChannelObserver {
    fn on_outcome(&self, outcome: &ReportOutcome) {
        // 수신측이 사라졌으면 무시
        let _ = self.tx.send(outcome.clone());
    }
}
