//! 기기 식별자.
//!
//! `IdentityProvider` 포트 구현. 사용자 ID가 없는 리포트는 기기 식별자로 보낸다.

use std::path::PathBuf;
use std::sync::OnceLock;
use sysinfo::System;
use tracing::{debug, warn};
use traffic_core::ports::identity::IdentityProvider;

/// machine-id 후보 경로 (systemd, dbus)
const MACHINE_ID_PATHS: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// machine-id → 호스트명 순으로 조회하는 기기 식별자
///
/// 첫 조회 결과를 프로세스 수명 동안 캐시한다.
pub struct MachineIdentityProvider {
    paths: Vec<PathBuf>,
    cached: OnceLock<Option<String>>,
}

impl MachineIdentityProvider {
    pub fn new() -> Self {
        Self::with_paths(MACHINE_ID_PATHS.iter().map(PathBuf::from).collect())
    }

    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            cached: OnceLock::new(),
        }
    }

    fn resolve(&self) -> Option<String> {
        for path in &self.paths {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    let id = content.trim();
                    if !id.is_empty() {
                        debug!("기기 식별자 사용: {}", path.display());
                        return Some(id.to_string());
                    }
                }
                Err(e) => debug!("{} 읽기 실패: {e}", path.display()),
            }
        }

        let host = System::host_name().filter(|h| !h.trim().is_empty());
        if host.is_none() {
            warn!("기기 식별자를 찾을 수 없음");
        }
        host
    }
}

impl Default for MachineIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MachineIdentityProvider {
    fn default_user_id(&self) -> Option<String> {
        self.cached.get_or_init(|| self.resolve()).clone()
    }
}

/// 설정에 지정된 고정 사용자 ID
pub struct StaticIdentityProvider(String);

impl StaticIdentityProvider {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(user_id.into())
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn default_user_id(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
