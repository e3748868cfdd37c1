//! # traffic-network
//!
//! 수집 엔드포인트 네트워크 어댑터.
//! 리포트 레코드를 `POST /api/ingest`로 전송하는 reqwest 클라이언트와,
//! 호출자를 블로킹하지 않도록 전송을 단일 워커 태스크로 넘기는 디스패처를 제공한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use traffic_network::dispatcher::ReportDispatcher;
//! use traffic_network::http_client::HttpIngestClient;
//!
//! let client = Arc::new(HttpIngestClient::new(Duration::from_secs(5))?);
//! let dispatcher = ReportDispatcher::spawn(client, 64, None);
//! dispatcher.submit("http://127.0.0.1:8787", record);
//! ```

pub mod dispatcher;
pub mod http_client;
