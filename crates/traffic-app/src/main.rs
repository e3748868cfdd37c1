//! # traffic-app
//!
//! traffic-admin 바이너리 진입점.
//! `report`: 현재 프로세스 네트워크 카운터 델타를 주기적으로 수집 서버에 전송.
//! `serve`: 수집 서버 실행.

mod cli;
mod lifecycle;
mod report;
mod serve;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use traffic_core::config::AppConfig;
use traffic_core::config_manager::ConfigManager;

use crate::cli::{Args, Command};
use crate::lifecycle::LifecycleManager;

/// 워크스페이스 crate별 로그 필터
fn log_filter(level: &str) -> String {
    [
        "traffic_admin",
        "traffic_app",
        "traffic_core",
        "traffic_monitor",
        "traffic_network",
        "traffic_reporter",
        "traffic_web",
        "tower_http",
    ]
    .iter()
    .map(|target| format!("{target}={level}"))
    .collect::<Vec<_>>()
    .join(",")
}

/// 설정 로드. 경로 미지정 시 플랫폼 기본 경로, 실패하면 기본 설정.
fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            let manager = ConfigManager::with_path(path.clone())
                .with_context(|| format!("설정 파일 로드 실패: {}", path.display()))?;
            info!("설정 파일: {}", manager.config_path().display());
            Ok(manager.get())
        }
        None => match ConfigManager::new() {
            Ok(manager) => {
                info!("설정 파일: {}", manager.config_path().display());
                Ok(manager.get())
            }
            Err(e) => {
                warn!("설정 관리자 초기화 실패, 기본 설정 사용: {e}");
                Ok(AppConfig::default_config())
            }
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(&args.log_level))),
        )
        .init();

    let mut config = load_config(args.config.clone())?;
    args.command.apply(&mut config);
    config.validate().context("설정 검증 실패")?;

    let lifecycle = LifecycleManager::new();

    match args.command {
        Command::Report(_) => report::run(config, &lifecycle).await,
        Command::Serve(_) => serve::run(config, &lifecycle).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_covers_workspace() {
        let filter = log_filter("debug");
        assert!(filter.contains("traffic_reporter=debug"));
        assert!(filter.contains("traffic_web=debug"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn explicit_config_path_is_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = load_config(Some(path.clone())).unwrap();
        assert!(path.exists());
        assert_eq!(config.reporter.interval_secs, 10);
    }

    #[test]
    fn broken_config_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ broken").unwrap();
        assert!(load_config(Some(path)).is_err());
    }
}
