//! 트래픽 리포터 도메인 모델.
//!
//! SDK와 수집 서버가 공유하는 데이터 구조체를 정의한다.

pub mod outcome;
pub mod traffic;
