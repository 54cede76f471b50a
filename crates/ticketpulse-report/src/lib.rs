//! # ticketpulse-report
//!
//! 티켓 스트림을 지표로 접는 순수 로직과 작업 오케스트레이션.
//!
//! ## 구조
//!
//! - [`pager`]: 빈 페이지까지 티켓 페이지를 순회
//! - [`aggregator`]: 티켓 스트림 → [`aggregator::ReportAggregate`] (네트워크 없음)
//! - [`tags`]: 상위 태그 선택, 태그 슬러그
//! - [`payload`]: 집계 결과 → 순서가 고정된 지표 레코드 목록
//! - [`csat_file`]: 로컬 CSV CSAT 소스
//! - [`job`]: 페이지 순회 → 집계 → CSAT → 페이로드 → 푸시

pub mod aggregator;
pub mod csat_file;
pub mod job;
pub mod pager;
pub mod payload;
pub mod tags;
