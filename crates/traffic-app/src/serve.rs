//! `serve` 명령: 수집 서버 실행.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;
use traffic_core::config::AppConfig;
use traffic_web::IngestServer;

use crate::lifecycle::LifecycleManager;

/// 종료 신호 후 서버 정리 허용 시간
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

type ServerTask = JoinHandle<std::io::Result<()>>;

/// 종료 신호까지 수집 서버 실행
///
/// 서버가 먼저 실패하면(포트 전부 사용 중 등) 시그널을 기다리지 않고 에러를 반환한다.
pub async fn run(config: AppConfig, lifecycle: &LifecycleManager) -> Result<()> {
    let server = IngestServer::new(config.web);
    let mut server_task = tokio::spawn(server.run(lifecycle.subscribe()));

    tokio::select! {
        joined = &mut server_task => {
            return joined
                .context("수집 서버 태스크 비정상 종료")?
                .context("수집 서버 실행 실패");
        }
        signal = lifecycle.wait_for_signal() => {
            signal.context("시그널 핸들러 등록 실패")?;
        }
    }

    finish(server_task, SHUTDOWN_GRACE).await
}

/// 종료 신호 이후 서버 태스크 대기. `grace` 안에 끝나지 않으면 중단한다.
async fn finish(mut server_task: ServerTask, grace: Duration) -> Result<()> {
    match tokio::time::timeout(grace, &mut server_task).await {
        Ok(joined) => joined
            .context("수집 서버 태스크 비정상 종료")?
            .context("수집 서버 실행 실패"),
        Err(_) => {
            warn!("수집 서버가 {}초 안에 종료되지 않아 중단", grace.as_secs());
            server_task.abort();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stuck_server_is_aborted_after_grace() {
        let task: ServerTask = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok(())
        });
        let started = tokio::time::Instant::now();

        assert!(finish(task, Duration::from_secs(10)).await.is_ok());
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let task: ServerTask = tokio::spawn(async {
            Err(std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy"))
        });
        assert!(finish(task, Duration::from_secs(5)).await.is_err());
    }

    #[tokio::test]
    async fn open_sse_client_does_not_delay_exit() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let lifecycle = LifecycleManager::new();
        let server = IngestServer::new(AppConfig::default_config().web);
        let task: ServerTask = tokio::spawn(server.serve(listener, lifecycle.subscribe()));

        let mut socket = tokio::net::TcpStream::connect(addr).await.unwrap();
        socket
            .write_all(b"GET /api/sse?appId=shop HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut buf = vec![0u8; 1024];
        let n = socket.read(&mut buf).await.unwrap();
        assert!(String::from_utf8_lossy(&buf[..n]).starts_with("HTTP/1.1 200 OK"));

        lifecycle.shutdown();
        let started = std::time::Instant::now();
        assert!(finish(task, SHUTDOWN_GRACE).await.is_ok());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
