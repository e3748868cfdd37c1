//! API 라우트 정의.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성 (`/api` 하위)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 수집
        .route("/ingest", post(handlers::ingest::ingest))
        // 조회
        .route("/apps", get(handlers::apps::list_apps))
        .route("/snapshot", get(handlers::snapshot::get_snapshot))
        // 실시간 스트림 (SSE)
        .route("/sse", get(handlers::stream::snapshot_stream))
        // 모의 트래픽
        .route("/mock/start", post(handlers::mock::start_mock))
        .route("/mock/stop", post(handlers::mock::stop_mock))
        // APK 등록
        .route("/apk/register", post(handlers::apk::register_apk))
        .route("/apk/list", get(handlers::apk::list_apks))
        .route("/apk/info", get(handlers::apk::apk_info))
}
