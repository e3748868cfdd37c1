//! # traffic-reporter
//!
//! 프로세스 네트워크 카운터를 주기적으로 샘플링하여 증가량을
//! 수집 엔드포인트로 보내는 리포터.
//!
//! ```rust,ignore
//! let reporter = CounterReporter::new(source, identity, dispatcher);
//! reporter.initialize("your-app-id", "http://your-backend:8787").await?;
//!
//! // 수동 리포트
//! reporter.report_once(Some("user-1"), bytes_in, bytes_out);
//!
//! // 자동 리포트 (10초마다)
//! reporter.start_periodic_reporting(Duration::from_secs(10))?;
//! ```
//!
//! 전송 실패는 호출자에게 전파되지 않는다. 결과는 디스패처에 연결한
//! `ReportObserver`와 [`CounterReporter::stats`]로 관찰한다.

pub mod reporter;

pub use reporter::{CounterReporter, Session, TickOutcome, UNKNOWN_USER_ID};
