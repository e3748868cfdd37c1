//! # traffic-web
//!
//! 트래픽 수집 서버.
//! Axum 기반 REST API + SSE.
//!
//! ## 기능
//! - 리포트 수집 (`POST /api/ingest`)
//! - 앱 목록 / 스냅샷 조회
//! - 앱별 실시간 스냅샷 스트림 (SSE)
//! - 모의 트래픽 생성
//! - APK 등록 / 조회

pub mod apk;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod mock;
pub mod routes;
pub mod store;

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use traffic_core::config::WebConfig;

pub use apk::ApkRegistry;
pub use hub::SnapshotHub;
pub use mock::MockTraffic;
pub use store::{Snapshot, TrafficStore};

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 수집 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 앱별 집계 저장소
    pub store: Arc<TrafficStore>,
    /// SSE 스냅샷 채널
    pub hub: Arc<SnapshotHub>,
    /// 모의 트래픽 관리자
    pub mock: Arc<MockTraffic>,
    /// 등록된 APK 정보
    pub apk: Arc<ApkRegistry>,
    /// 스트림 종료 신호 (true면 열린 SSE 스트림을 닫는다)
    closing: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// 설정의 윈도우/TTL로 빈 상태 생성
    pub fn new(config: &WebConfig) -> Self {
        Self {
            store: Arc::new(TrafficStore::new(
                config.window_secs,
                config.active_user_ttl_secs,
            )),
            hub: Arc::new(SnapshotHub::new()),
            mock: Arc::new(MockTraffic::new()),
            apk: Arc::new(ApkRegistry::new()),
            closing: Arc::new(watch::channel(false).0),
        }
    }

    /// 열린 SSE 스트림을 모두 닫는다. 이후 구독은 첫 스냅샷만 받고 끝난다.
    pub fn close_streams(&self) {
        self.closing.send_replace(true);
    }

    /// 스트림 종료 시점에 완료되는 future
    pub(crate) fn streams_closed(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.closing.subscribe();
        async move {
            let _ = rx.wait_for(|closing| *closing).await;
        }
    }
}

/// 전체 라우터 (CORS + 요청 트레이싱 포함)
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 시도할 포트: `base`부터 최대 10개, 65535를 넘지 않는다
fn candidate_ports(base: u16) -> impl Iterator<Item = u16> {
    (0..MAX_PORT_ATTEMPTS).map_while(move |attempt| base.checked_add(attempt))
}

/// 트래픽 수집 서버
pub struct IngestServer {
    config: WebConfig,
    state: AppState,
}

impl IngestServer {
    /// 새 수집 서버 생성
    pub fn new(config: WebConfig) -> Self {
        let state = AppState::new(&config);
        Self { config, state }
    }

    /// 서버 실행
    ///
    /// 설정 포트부터 시작하여, 사용 중이면 다음 포트를 시도한다.
    /// 최대 10개 포트를 시도한 후 실패하면 에러를 반환한다.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let base_port = self.config.port;
        let mut last_error = None;

        for port in candidate_ports(base_port) {

            let addr: SocketAddr = match format!("{host}:{port}").parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {host}:{port}: {e}");
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if port != base_port {
                        warn!("포트 {base_port} 사용 불가, 대체 포트 {port} 사용");
                    }
                    info!("트래픽 수집 서버 시작: http://{addr}");
                    return self.serve(listener, shutdown_rx).await;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    warn!("포트 {port} 이미 사용 중, 다음 포트 시도...");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!(
                    "포트 {}-{} 모두 사용 불가",
                    base_port,
                    base_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
                ),
            )
        }))
    }

    /// 이미 바인드된 리스너에서 서버 실행
    ///
    /// 스냅샷 브로드캐스트와 (설정된 경우) APK 자동 등록, 모의 트래픽을 함께 구동하고,
    /// 종료 신호를 받으면 열린 SSE 스트림을 닫고 모두 정리한다.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let state = self.state;

        let broadcaster = tokio::spawn(hub::run_broadcaster(
            state.hub.clone(),
            state.store.clone(),
            self.config.broadcast_interval(),
            shutdown_rx.clone(),
        ));

        if let Some(dir) = self.config.apk_dir.clone() {
            let apk = state.apk.clone();
            tokio::spawn(async move {
                let registered = apk.register_dir(&dir).await;
                info!("APK 자동 등록 완료: {registered}개 ({})", dir.display());
            });
        }

        if let Some(app_id) = self.config.mock_app_id.as_deref() {
            state
                .mock
                .start(state.store.clone(), app_id, mock::DEFAULT_MOCK_USERS);
        }

        let mock = state.mock.clone();
        let closer = state.clone();
        let mut graceful_rx = shutdown_rx;
        let result = axum::serve(listener, router(state))
            .with_graceful_shutdown(async move {
                loop {
                    if *graceful_rx.borrow() {
                        info!("수집 서버 종료 신호 수신");
                        break;
                    }
                    if graceful_rx.changed().await.is_err() {
                        break;
                    }
                }
                // SSE 스트림이 끝나야 연결이 닫힌다
                closer.close_streams();
            })
            .await;

        mock.stop_all();
        broadcaster.abort();
        info!("트래픽 수집 서버 종료");
        result
    }
}
