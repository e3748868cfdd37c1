//! APK 등록 정보.
//!
//! `aapt dump badging` 출력에서 패키지/버전/라벨을 추출하고,
//! 도구가 없거나 실패하면 파일 이름과 크기만 기록한다.
//! 등록 정보는 appId 기준 메모리 맵에 보관한다.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// 기본 APK 분석 도구
pub const AAPT: &str = "aapt";

/// 메타데이터 추출 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMethod {
    Aapt,
    Fallback,
}

/// APK 메타데이터 (`apkInfo`)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApkMetadata {
    /// aapt로 분석에 성공했는지
    pub parsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ParseMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_sdk_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_sdk_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// MB 단위 크기 (소수점 2자리)
    #[serde(rename = "fileSizeMB", skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<String>,
    /// 파일을 읽지 못한 경우 사유
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 등록된 APK
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApkRecord {
    pub app_id: String,
    pub apk_path: String,
    pub apk_info: ApkMetadata,
    /// 등록 시각 (epoch 밀리초)
    pub registered_at: i64,
}

/// `key'value'` 형태에서 value 추출
fn quoted_after<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let start = text.find(key)? + key.len();
    let rest = &text[start..];
    let end = rest.find('\'')?;
    Some(&rest[..end]).filter(|v| !v.is_empty())
}

/// `aapt dump badging` 출력 파싱
pub fn parse_badging(stdout: &str) -> ApkMetadata {
    let field = |key: &str| quoted_after(stdout, key).map(str::to_string);
    ApkMetadata {
        parsed: true,
        method: Some(ParseMethod::Aapt),
        package_name: field("package: name='"),
        version_code: field("versionCode='"),
        version_name: field("versionName='"),
        app_name: field("application-label:'"),
        min_sdk_version: field("sdkVersion:'"),
        target_sdk_version: field("targetSdkVersion:'"),
        ..Default::default()
    }
}

async fn run_aapt(tool: &str, path: &Path) -> Option<String> {
    let output = match Command::new(tool)
        .arg("dump")
        .arg("badging")
        .arg(path)
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            debug!("{tool} 실행 불가: {e}");
            return None;
        }
    };
    if !output.status.success() {
        debug!("{tool} 분석 실패 ({}): {}", output.status, path.display());
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// APK 메타데이터 추출. 도구를 쓸 수 없으면 파일 이름/크기로 대체한다.
pub async fn parse_apk(tool: &str, path: &Path) -> ApkMetadata {
    if let Some(stdout) = run_aapt(tool, path).await {
        return parse_badging(&stdout);
    }

    match tokio::fs::metadata(path).await {
        Ok(meta) => ApkMetadata {
            parsed: false,
            method: Some(ParseMethod::Fallback),
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            file_size: Some(meta.len()),
            file_size_mb: Some(format!("{:.2}", meta.len() as f64 / (1024.0 * 1024.0))),
            ..Default::default()
        },
        Err(e) => ApkMetadata {
            parsed: false,
            error: Some(e.to_string()),
            ..Default::default()
        },
    }
}

/// `*.apk` 또는 `*.apk.*` 파일 여부
fn is_apk_file(name: &str) -> bool {
    name.ends_with(".apk") || name.contains(".apk.")
}

/// appId별 APK 등록소
pub struct ApkRegistry {
    tool: String,
    entries: Mutex<HashMap<String, ApkRecord>>,
}

impl ApkRegistry {
    pub fn new() -> Self {
        Self::with_tool(AAPT)
    }

    /// 분석 도구 경로 지정
    pub fn with_tool(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// APK 등록 (같은 appId는 덮어쓴다)
    ///
    /// appId 미지정 시 패키지명, 그것도 없으면 확장자를 뺀 파일 이름을 쓴다.
    pub async fn register(&self, apk_path: &str, app_id: Option<&str>) -> ApkRecord {
        let path = Path::new(apk_path);
        let info = parse_apk(&self.tool, path).await;

        let app_id = app_id
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| info.package_name.clone())
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| apk_path.to_string())
            });

        let record = ApkRecord {
            app_id,
            apk_path: apk_path.to_string(),
            apk_info: info,
            registered_at: chrono::Utc::now().timestamp_millis(),
        };
        self.entries
            .lock()
            .insert(record.app_id.clone(), record.clone());
        record
    }

    /// 디렉토리의 APK 파일 일괄 등록. 등록한 개수를 반환한다.
    pub async fn register_dir(&self, dir: &Path) -> usize {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("APK 디렉토리 읽기 실패: {}: {e}", dir.display());
                return 0;
            }
        };

        let mut count = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("APK 디렉토리 순회 실패: {}: {e}", dir.display());
                    break;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_apk_file(&name) {
                continue;
            }
            let path = entry.path();
            let record = self.register(&path.to_string_lossy(), None).await;
            info!("APK 자동 등록: {} ({name})", record.app_id);
            count += 1;
        }
        count
    }

    pub fn get(&self, app_id: &str) -> Option<ApkRecord> {
        self.entries.lock().get(app_id).cloned()
    }

    /// 등록된 APK 목록 (appId 순)
    pub fn list(&self) -> Vec<ApkRecord> {
        let mut records: Vec<_> = self.entries.lock().values().cloned().collect();
        records.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        records
    }
}

impl Default for ApkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
