//! 앱별 스냅샷 브로드캐스트.
//!
//! SSE 구독자가 있는 앱에 대해서만 주기적으로 스냅샷을 계산해 전송한다.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::store::{Snapshot, TrafficStore};

/// 앱별 브로드캐스트 채널 용량
const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

/// 앱별 스냅샷 채널 모음
#[derive(Debug, Default)]
pub struct SnapshotHub {
    channels: Mutex<HashMap<String, broadcast::Sender<Arc<Snapshot>>>>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 앱 채널 구독 (없으면 생성)
    pub fn subscribe(&self, app_id: &str) -> broadcast::Receiver<Arc<Snapshot>> {
        self.channels
            .lock()
            .entry(app_id.to_string())
            .or_insert_with(|| broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 구독자 수
    pub fn subscriber_count(&self, app_id: &str) -> usize {
        self.channels
            .lock()
            .get(app_id)
            .map_or(0, |tx| tx.receiver_count())
    }

    /// 구독자가 있는 앱마다 스냅샷 전송. 구독자가 없는 채널은 정리한다.
    ///
    /// 전송한 앱 수를 반환한다.
    pub fn publish(&self, store: &TrafficStore, now_ms: i64) -> usize {
        let mut channels = self.channels.lock();
        channels.retain(|_, tx| tx.receiver_count() > 0);

        let mut sent = 0;
        for (app_id, tx) in channels.iter() {
            let snapshot = Arc::new(store.snapshot(app_id, now_ms));
            if tx.send(snapshot).is_ok() {
                sent += 1;
            }
        }
        sent
    }
}

/// 브로드캐스트 루프. 종료 신호까지 `period`마다 `publish`.
pub async fn run_broadcaster(
    hub: Arc<SnapshotHub>,
    store: Arc<TrafficStore>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let sent = hub.publish(&store, chrono::Utc::now().timestamp_millis());
                if sent > 0 {
                    debug!("스냅샷 브로드캐스트: {sent}개 앱");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    info!("스냅샷 브로드캐스트 종료");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IngestEvent;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn publish_without_subscribers_sends_nothing() {
        let hub = SnapshotHub::new();
        let store = TrafficStore::new(60, 60);

        let rx = hub.subscribe("shop");
        drop(rx);

        assert_eq!(hub.publish(&store, T0), 0);
        assert_eq!(hub.subscriber_count("shop"), 0);
        assert!(store.app_ids().is_empty());
    }

    #[test]
    fn publish_reaches_each_app_subscriber() {
        let hub = SnapshotHub::new();
        let store = TrafficStore::new(60, 60);
        store.ingest(
            &IngestEvent {
                app_id: "shop".to_string(),
                user_id: "u1".to_string(),
                bytes_in: 42,
                bytes_out: 7,
                ts: T0,
            },
            T0,
        );

        let mut shop = hub.subscribe("shop");
        let mut blog = hub.subscribe("blog");
        assert_eq!(hub.publish(&store, T0 + 100), 2);

        let snap = shop.try_recv().unwrap();
        assert_eq!(snap.app_id, "shop");
        assert_eq!(snap.totals.bytes_in, 42);
        assert_eq!(blog.try_recv().unwrap().app_id, "blog");
    }

    #[tokio::test(start_paused = true)]
    async fn broadcaster_stops_on_shutdown() {
        let hub = Arc::new(SnapshotHub::new());
        let store = Arc::new(TrafficStore::new(60, 60));
        let mut rx = hub.subscribe("shop");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_broadcaster(
            hub.clone(),
            store,
            Duration::from_secs(1),
            shutdown_rx,
        ));

        let snap = rx.recv().await.unwrap();
        assert_eq!(snap.app_id, "shop");

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
