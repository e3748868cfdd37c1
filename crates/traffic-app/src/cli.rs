//! 명령행 인자 정의와 설정 덮어쓰기.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use traffic_core::config::AppConfig;

/// 프로세스 네트워크 트래픽 리포터 및 수집 서버
#[derive(Parser, Debug)]
#[command(name = "traffic-admin")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    pub log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 카운터 델타를 주기적으로 수집 서버에 전송
    Report(ReportArgs),
    /// 수집 서버 실행
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug, Default)]
pub struct ReportArgs {
    /// 수집 서버 주소 (예: http://192.168.1.100:8787)
    #[arg(long, short = 's')]
    pub server: Option<String>,

    /// 애플리케이션 ID
    #[arg(long)]
    pub app_id: Option<String>,

    /// 고정 사용자 ID (기본: 기기 식별자)
    #[arg(long)]
    pub user_id: Option<String>,

    /// 자동 리포트 주기 (초)
    #[arg(long)]
    pub interval: Option<u64>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ServeArgs {
    /// 바인드 포트
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// 외부 접근 허용 (0.0.0.0 바인드)
    #[arg(long)]
    pub allow_external: bool,

    /// 시작 시 모의 트래픽을 생성할 앱 ID
    #[arg(long, value_name = "APP")]
    pub mock: Option<String>,

    /// 시작 시 APK 파일을 자동 등록할 디렉토리
    #[arg(long, value_name = "DIR")]
    pub apk_dir: Option<PathBuf>,
}

impl Command {
    /// CLI 값으로 설정 덮어쓰기 (파일에는 저장하지 않음)
    pub fn apply(&self, config: &mut AppConfig) {
        match self {
            Command::Report(args) => {
                if let Some(server) = &args.server {
                    config.reporter.base_url = server.clone();
                }
                if let Some(app_id) = &args.app_id {
                    config.reporter.app_id = app_id.clone();
                }
                if let Some(user_id) = &args.user_id {
                    config.reporter.user_id = Some(user_id.clone());
                }
                if let Some(interval) = args.interval {
                    config.reporter.interval_secs = interval;
                }
            }
            Command::Serve(args) => {
                if let Some(port) = args.port {
                    config.web.port = port;
                }
                if args.allow_external {
                    config.web.allow_external = true;
                }
                if let Some(app_id) = &args.mock {
                    config.web.mock_app_id = Some(app_id.clone());
                }
                if let Some(dir) = &args.apk_dir {
                    config.web.apk_dir = Some(dir.clone());
                }
            }
        }
    }
}
