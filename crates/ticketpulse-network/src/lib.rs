//! # ticketpulse-network
//!
//! 외부 REST API 어댑터.
//! 티켓 목록/건수 조회, 만족도 조회, 대시보드 푸시를 담당하며
//! 모든 호출은 [`retry::send_with_retry`]의 명시적 재시도 정책을 따른다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use ticketpulse_network::retry::RetryPolicy;
//! use ticketpulse_network::ticket_client::EnchantClient;
//! use ticketpulse_network::push_client::DataboxClient;
//! ```

pub mod csat_client;
pub mod push_client;
pub mod retry;
pub mod ticket_client;
