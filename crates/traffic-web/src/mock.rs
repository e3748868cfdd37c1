//! 모의 트래픽 생성기.
//!
//! 앱마다 1초에 10건씩 임의 사용자 리포트를 저장소에 직접 반영한다.

use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::store::{IngestEvent, TrafficStore};

/// 기본 모의 사용자 수
pub const DEFAULT_MOCK_USERS: u32 = 50;
/// 최대 모의 사용자 수
pub const MAX_MOCK_USERS: u32 = 5_000;
/// 초당 생성 이벤트 수
const EVENTS_PER_TICK: usize = 10;
const TICK: Duration = Duration::from_secs(1);

/// 요청값을 1..=5000 범위로 보정. 0이나 누락은 기본값.
pub fn clamp_users(requested: Option<i64>) -> u32 {
    match requested {
        None | Some(0) => DEFAULT_MOCK_USERS,
        Some(n) => n.clamp(1, i64::from(MAX_MOCK_USERS)) as u32,
    }
}

/// 무작위 이벤트 1건
fn random_event<R: Rng>(rng: &mut R, app_id: &str, users: u32, ts: i64) -> IngestEvent {
    IngestEvent {
        app_id: app_id.to_string(),
        user_id: format!("mock_u_{}", rng.random_range(0..users)),
        bytes_in: rng.random_range(200..5_200),
        bytes_out: rng.random_range(100..3_100),
        ts,
    }
}

/// 앱별 모의 트래픽 태스크 관리자
#[derive(Debug, Default)]
pub struct MockTraffic {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl MockTraffic {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모의 트래픽 시작. 이미 실행 중이면 새 설정으로 교체한다.
    pub fn start(&self, store: Arc<TrafficStore>, app_id: &str, users: u32) {
        let users = users.clamp(1, MAX_MOCK_USERS);
        let name = app_id.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
            loop {
                ticker.tick().await;
                let now = chrono::Utc::now().timestamp_millis();
                let events: Vec<IngestEvent> = {
                    let mut rng = rand::rng();
                    (0..EVENTS_PER_TICK)
                        .map(|_| random_event(&mut rng, &name, users, now))
                        .collect()
                };
                for event in &events {
                    store.ingest(event, now);
                }
            }
        });

        if let Some(previous) = self.tasks.lock().insert(app_id.to_string(), handle) {
            previous.abort();
        }
        info!("모의 트래픽 시작: app_id={app_id}, users={users}");
    }

    /// 모의 트래픽 중지. 실행 중이 아니었으면 `false`.
    pub fn stop(&self, app_id: &str) -> bool {
        match self.tasks.lock().remove(app_id) {
            Some(handle) => {
                handle.abort();
                info!("모의 트래픽 중지: app_id={app_id}");
                true
            }
            None => false,
        }
    }

    /// 실행 중 여부
    pub fn is_running(&self, app_id: &str) -> bool {
        self.tasks
            .lock()
            .get(app_id)
            .is_some_and(|h| !h.is_finished())
    }

    /// 모든 모의 트래픽 중지
    pub fn stop_all(&self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}

impl Drop for MockTraffic {
    fn drop(&mut self) {
        self.stop_all();
    }
}
