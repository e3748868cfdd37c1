//! 애플리케이션 설정 구조체.
//!
//! 리포터(앱 ID, 엔드포인트, 주기), 카운터 소스, 수집 서버 설정을 정의한다.
//! `ConfigManager`를 통해 JSON 파일에서 로드하고 CLI 인자로 덮어쓴다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 리포트 전송 큐 기본 용량
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 리포터 설정
    #[serde(default)]
    pub reporter: ReporterConfig,
    /// 카운터 소스 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 수집 서버 설정
    #[serde(default)]
    pub web: WebConfig,
}

// ============================================================
// 리포터 설정
// ============================================================

/// 리포터 설정: 세션 식별자, 엔드포인트, 자동 리포트 주기
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// 애플리케이션 ID (여러 앱 구분용)
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// 수집 서버 주소 (예: "http://192.168.1.100:8787")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 고정 사용자 ID. 없으면 기기 식별자 사용
    #[serde(default)]
    pub user_id: Option<String>,
    /// 자동 리포트 주기 (초)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// 요청 연결/읽기 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 디스패치 큐 용량
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            base_url: default_base_url(),
            user_id: None,
            interval_secs: default_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ============================================================
// 카운터 소스 설정
// ============================================================

/// 카운터 소스 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterSourceKind {
    /// Linux는 /proc, 그 외는 인터페이스 합계
    #[default]
    Auto,
    /// `/proc/self/net/dev` (Linux 전용)
    ProcNetDev,
    /// sysinfo 인터페이스 합계
    Interfaces,
}

/// 카운터 소스 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub source: CounterSourceKind,
    /// 루프백 인터페이스 포함 여부
    #[serde(default)]
    pub include_loopback: bool,
}

// ============================================================
// 수집 서버 설정
// ============================================================

/// 수집 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 바인드 포트
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 외부 접근 허용 (false면 127.0.0.1만 바인드)
    #[serde(default)]
    pub allow_external: bool,
    /// 슬라이딩 윈도우 길이 (초)
    #[serde(default = "default_window_secs")]
    pub window_secs: usize,
    /// 활성 사용자 판정 TTL (초)
    #[serde(default = "default_active_user_ttl_secs")]
    pub active_user_ttl_secs: u64,
    /// SSE 스냅샷 브로드캐스트 주기 (밀리초)
    #[serde(default = "default_broadcast_interval_ms")]
    pub broadcast_interval_ms: u64,
    /// 시작 시 모의 트래픽을 생성할 앱 ID
    #[serde(default)]
    pub mock_app_id: Option<String>,
    /// 시작 시 `*.apk` 파일을 자동 등록할 디렉토리
    #[serde(default)]
    pub apk_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            allow_external: false,
            window_secs: default_window_secs(),
            active_user_ttl_secs: default_active_user_ttl_secs(),
            broadcast_interval_ms: default_broadcast_interval_ms(),
            mock_app_id: None,
            apk_dir: None,
        }
    }
}

impl WebConfig {
    /// SSE 브로드캐스트 주기를 Duration으로 반환 (최소 1ms)
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms.max(1))
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            reporter: ReporterConfig::default(),
            monitor: MonitorConfig::default(),
            web: WebConfig::default(),
        }
    }

    /// 자동 리포트 주기를 Duration으로 반환
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.reporter.interval_secs)
    }

    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.reporter.request_timeout_ms)
    }

    /// 0 주기/용량 등 실행 불가능한 값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.reporter.app_id.trim().is_empty() {
            return Err(CoreError::validation("reporter.app_id", "비어 있음"));
        }
        if self.reporter.base_url.trim().is_empty() {
            return Err(CoreError::validation("reporter.base_url", "비어 있음"));
        }
        if self.reporter.interval_secs == 0 {
            return Err(CoreError::validation("reporter.interval_secs", "0보다 커야 함"));
        }
        if self.reporter.request_timeout_ms == 0 {
            return Err(CoreError::validation(
                "reporter.request_timeout_ms",
                "0보다 커야 함",
            ));
        }
        if self.reporter.queue_capacity == 0 {
            return Err(CoreError::validation("reporter.queue_capacity", "0보다 커야 함"));
        }
        if self.web.window_secs == 0 {
            return Err(CoreError::validation("web.window_secs", "0보다 커야 함"));
        }
        if self.web.broadcast_interval_ms == 0 {
            return Err(CoreError::validation(
                "web.broadcast_interval_ms",
                "0보다 커야 함",
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_app_id() -> String {
    "demo-app".to_string()
}
fn default_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}
fn default_interval_secs() -> u64 {
    10
}
fn default_request_timeout_ms() -> u64 {
    5_000
}
fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}
fn default_web_port() -> u16 {
    8787
}
fn default_window_secs() -> usize {
    60
}
fn default_active_user_ttl_secs() -> u64 {
    60
}
fn default_broadcast_interval_ms() -> u64 {
    1_000
}
