//! 앱별 트래픽 집계 저장소.
//!
//! 앱마다 초 단위 버킷 `window`개로 구성된 슬라이딩 윈도우, 누적 합계,
//! 사용자별 마지막 수신 시각을 메모리에 유지한다.
//!
//! 윈도우는 앞으로만 이동한다. 최신 초보다 오래된 타임스탬프는
//! 최신 버킷에 더해진다.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// 수집 이벤트 1건 (검증 완료)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestEvent {
    pub app_id: String,
    pub user_id: String,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// epoch 밀리초
    pub ts: i64,
}

/// 누적 바이트 합계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// 최신 초 버킷 기준 현재 처리량
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRate {
    pub bytes_in_per_sec: u64,
    pub bytes_out_per_sec: u64,
}

/// 히스토리 1초 구간
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub sec: i64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// 앱 스냅샷 (`GET /api/snapshot` 응답 및 SSE 페이로드)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub ok: bool,
    pub app_id: String,
    pub ts: i64,
    pub active_users: usize,
    pub current: CurrentRate,
    pub totals: Totals,
    /// 오래된 순
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    sec: i64,
    bytes_in: u64,
    bytes_out: u64,
}

impl Bucket {
    fn empty(sec: i64) -> Self {
        Self {
            sec,
            bytes_in: 0,
            bytes_out: 0,
        }
    }
}

#[derive(Debug)]
struct AppTraffic {
    users_last_seen: HashMap<String, i64>,
    totals: Totals,
    last_sec: i64,
    buckets: VecDeque<Bucket>,
}

impl AppTraffic {
    fn new(window: usize, now_sec: i64) -> Self {
        let mut app = Self {
            users_last_seen: HashMap::new(),
            totals: Totals::default(),
            last_sec: now_sec,
            buckets: VecDeque::with_capacity(window),
        };
        app.reset_to(window, now_sec);
        app
    }

    fn reset_to(&mut self, window: usize, sec: i64) {
        let span = window as i64;
        self.buckets.clear();
        self.buckets
            .extend((0..span).map(|i| Bucket::empty(sec - (span - 1 - i))));
        self.last_sec = sec;
    }

    fn rotate_to(&mut self, window: usize, target_sec: i64) {
        if target_sec <= self.last_sec {
            return;
        }
        let gap = target_sec - self.last_sec;
        if gap >= window as i64 {
            self.reset_to(window, target_sec);
            return;
        }
        for sec in self.last_sec + 1..=target_sec {
            self.buckets.pop_front();
            self.buckets.push_back(Bucket::empty(sec));
        }
        self.last_sec = target_sec;
    }
}

/// 메모리 트래픽 저장소
#[derive(Debug)]
pub struct TrafficStore {
    window: usize,
    active_user_ttl_ms: i64,
    apps: Mutex<HashMap<String, AppTraffic>>,
}

impl TrafficStore {
    /// `window`초 윈도우, `active_user_ttl_secs`초 활성 사용자 TTL
    pub fn new(window: usize, active_user_ttl_secs: u64) -> Self {
        Self {
            window: window.max(1),
            active_user_ttl_ms: i64::try_from(active_user_ttl_secs.saturating_mul(1000))
                .unwrap_or(i64::MAX),
            apps: Mutex::new(HashMap::new()),
        }
    }

    /// 이벤트 반영. 처음 보는 앱은 `now_ms` 기준 빈 윈도우로 생성한다.
    pub fn ingest(&self, event: &IngestEvent, now_ms: i64) {
        let sec = event.ts.div_euclid(1000);
        let mut apps = self.apps.lock();
        let app = apps
            .entry(event.app_id.clone())
            .or_insert_with(|| AppTraffic::new(self.window, now_ms.div_euclid(1000)));

        app.rotate_to(self.window, sec);
        if let Some(newest) = app.buckets.back_mut() {
            newest.bytes_in = newest.bytes_in.saturating_add(event.bytes_in);
            newest.bytes_out = newest.bytes_out.saturating_add(event.bytes_out);
        }
        app.totals.bytes_in = app.totals.bytes_in.saturating_add(event.bytes_in);
        app.totals.bytes_out = app.totals.bytes_out.saturating_add(event.bytes_out);
        app.users_last_seen.insert(event.user_id.clone(), event.ts);
    }

    /// `now_ms` 시점 스냅샷
    ///
    /// 윈도우를 현재 초로 이동하고 TTL이 지난 사용자를 제거한다.
    /// 처음 보는 앱이면 빈 상태로 등록된다.
    pub fn snapshot(&self, app_id: &str, now_ms: i64) -> Snapshot {
        let now_sec = now_ms.div_euclid(1000);
        let mut apps = self.apps.lock();
        let app = apps
            .entry(app_id.to_string())
            .or_insert_with(|| AppTraffic::new(self.window, now_sec));

        app.rotate_to(self.window, now_sec);

        let ttl = self.active_user_ttl_ms;
        app.users_last_seen
            .retain(|_, last_seen| now_ms.saturating_sub(*last_seen) <= ttl);

        let current = app
            .buckets
            .back()
            .map(|b| CurrentRate {
                bytes_in_per_sec: b.bytes_in,
                bytes_out_per_sec: b.bytes_out,
            })
            .unwrap_or_default();

        Snapshot {
            ok: true,
            app_id: app_id.to_string(),
            ts: now_ms,
            active_users: app.users_last_seen.len(),
            current,
            totals: app.totals,
            history: app
                .buckets
                .iter()
                .map(|b| HistoryPoint {
                    sec: b.sec,
                    bytes_in: b.bytes_in,
                    bytes_out: b.bytes_out,
                })
                .collect(),
        }
    }

    /// 등록된 앱 ID (정렬)
    pub fn app_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.apps.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}
