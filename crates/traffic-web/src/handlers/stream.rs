//! SSE 실시간 스냅샷 스트림 핸들러.

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

use super::{now_ms, AppQuery};
use crate::error::ApiError;
use crate::store::Snapshot;
use crate::AppState;

/// 첫 이벤트 이름
pub const SNAPSHOT_EVENT: &str = "snapshot";
/// 주기 갱신 이벤트 이름
pub const UPDATE_EVENT: &str = "update";

fn to_event(name: &'static str, snapshot: &Snapshot) -> Option<Event> {
    let json = serde_json::to_string(snapshot).ok()?;
    Some(Event::default().event(name).data(json))
}

/// GET /api/sse?appId=
///
/// 구독 직후 `snapshot` 이벤트 1회, 이후 브로드캐스트 주기마다 `update` 이벤트.
/// 서버 종료 시 스트림이 끝난다.
pub async fn snapshot_stream(
    State(state): State<AppState>,
    Query(query): Query<AppQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let app_id = query.require()?;

    // 구독을 먼저 잡아 첫 스냅샷과 다음 update 사이 누락을 막는다
    let rx = state.hub.subscribe(&app_id);
    let initial = state.store.snapshot(&app_id, now_ms());
    debug!("SSE 구독: app_id={app_id}");

    let first = stream::iter(to_event(SNAPSHOT_EVENT, &initial).map(Ok));
    let updates = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(snapshot) => to_event(UPDATE_EVENT, &snapshot).map(Ok),
        Err(_) => None, // 지연된 구독자는 건너뛴 스냅샷을 버린다
    });

    // 서버 종료가 시작되면 스트림을 끝내 연결이 닫히게 한다
    let events = futures::StreamExt::take_until(first.chain(updates), state.streams_closed());

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}
