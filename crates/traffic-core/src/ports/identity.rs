//! 기본 사용자 식별자 포트.
//!
//! 리포트에 사용자 ID가 없으면 플랫폼 기기 식별자로 대체한다.
//! 구현: `traffic-monitor::identity`

/// 기기 단위 영속 식별자 제공자
pub trait IdentityProvider: Send + Sync {
    /// 기본 사용자 ID. 조회할 수 없으면 `None`.
    fn default_user_id(&self) -> Option<String>;
}
