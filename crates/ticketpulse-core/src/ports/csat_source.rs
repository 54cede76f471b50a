//! CSAT 소스 포트.
//!
//! 구현: CSV 파일 (`ticketpulse-report`), 만족도 API (`ticketpulse-network`)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::csat::CsatSummary;
use crate::models::month::ReportWindow;

/// 선택적 CSAT 데이터 소스
#[async_trait]
pub trait CsatSource: Send + Sync {
    /// 소스 이름 (로그용)
    fn name(&self) -> &'static str;

    /// 윈도우 구간의 CSAT 요약 로드
    ///
    /// 데이터가 없거나 소스가 비활성/미발견이면 `Ok(None)`.
    /// 호출자는 `Err`도 CSAT 생략으로 처리한다.
    async fn load(&self, window: &ReportWindow) -> Result<Option<CsatSummary>, CoreError>;
}
