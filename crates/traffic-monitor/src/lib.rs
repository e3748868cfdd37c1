//! # traffic-monitor
//!
//! 네트워크 카운터 소스 어댑터.
//! 현재 프로세스가 속한 네트워크 네임스페이스의 누적 수신/송신 바이트를 읽고,
//! 기본 사용자 ID로 쓸 기기 식별자를 제공한다.

pub mod counter;
pub mod identity;

#[cfg(target_os = "linux")]
pub mod linux;

pub use counter::{create_counter_source, InterfaceCounterSource};
pub use identity::{MachineIdentityProvider, StaticIdentityProvider};
