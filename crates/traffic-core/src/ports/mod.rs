//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 어댑터 crate(`traffic-monitor`, `traffic-network`)가 이 trait들을 구현하며,
//! `traffic-reporter`는 `Arc<dyn T>`로만 의존한다.

pub mod counter;
pub mod identity;
pub mod ingest;
