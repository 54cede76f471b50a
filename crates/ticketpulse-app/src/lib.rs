//! # ticketpulse-app
//!
//! 설정 로드와 어댑터 와이어링. 바이너리(`ticketpulse`)와 통합 테스트가 공유한다.

pub mod settings;
pub mod wiring;
