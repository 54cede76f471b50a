//! 도메인 모델.
//!
//! 티켓 API 입력, 월 버킷/리포트 윈도우, 출력 지표 레코드, CSAT 요약을 정의한다.

pub mod csat;
pub mod metric;
pub mod month;
pub mod ticket;
pub mod time;
