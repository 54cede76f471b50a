//! 티켓 API 포트.
//!
//! 구현: `ticketpulse-network` crate (reqwest)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::ticket::{Ticket, TicketState};

/// 티켓 목록 조회 조건
#[derive(Debug, Clone, PartialEq)]
pub struct TicketQuery {
    /// 상태 필터
    pub state: TicketState,
    /// 서버측 하한 (`since_updated_at`). 서버 필터는 거칠 수 있으므로
    /// 윈도우 포함 여부는 클라이언트에서 다시 판정한다.
    pub since: Option<DateTime<Utc>>,
    /// 페이지 크기
    pub per_page: u32,
    /// 라벨 임베드 요청 여부
    pub embed_labels: bool,
}

impl TicketQuery {
    /// 윈도우 시작 이후 종료된 티켓 조회 조건
    pub fn closed_since(since: DateTime<Utc>, per_page: u32) -> Self {
        Self {
            state: TicketState::Closed,
            since: Some(since),
            per_page,
            embed_labels: true,
        }
    }
}

/// 티켓 목록 페이지 조회
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// 1부터 시작하는 페이지 번호의 티켓 목록 조회
    ///
    /// 빈 목록은 페이지네이션 종료를 뜻한다. 일시적 실패(429/5xx)는
    /// 같은 페이지로 재시도하며, 재시도 소진 또는 영구 실패는 에러로 전파한다.
    async fn fetch_page(&self, query: &TicketQuery, page: u32) -> Result<Vec<Ticket>, CoreError>;
}

/// 상태별 티켓 건수 조회 (count-only 변형)
#[async_trait]
pub trait TicketCounter: Send + Sync {
    /// 본문 대신 응답 헤더의 총 건수를 읽는다
    async fn count_tickets(
        &self,
        state: TicketState,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64, CoreError>;
}
