//! 포트 인터페이스 (trait).
//!
//! 헥사고날 아키텍처의 포트 레이어.
//! `ticketpulse-network`, `ticketpulse-report`의 어댑터가 이 trait들을 구현하며,
//! `ticketpulse-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 모든 async trait은 `async_trait` 매크로를 사용하여 object safety를 보장한다.

pub mod csat_source;
pub mod metric_sink;
pub mod ticket_source;
