//! 티켓 페이지 순회.

use ticketpulse_core::error::CoreError;
use ticketpulse_core::models::ticket::Ticket;
use ticketpulse_core::ports::ticket_source::{TicketQuery, TicketSource};
use tracing::{debug, info};

/// 페이지 상한. 서버가 `page`를 무시하고 같은 페이지를 반복 반환하는 경우 방지.
pub const MAX_PAGES: u32 = 10_000;

/// 순회 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    /// 항목이 있었던 페이지 수
    pub pages: u32,
    /// 받은 티켓 수
    pub tickets: u64,
}

/// 1페이지부터 빈 페이지가 나올 때까지 조회하며 티켓을 `on_ticket`에 넘긴다
///
/// 재시도는 소스 어댑터가 같은 페이지 번호로 처리한다. 에러는 그대로 전파.
pub async fn drain_tickets<F>(
    source: &dyn TicketSource,
    query: &TicketQuery,
    mut on_ticket: F,
) -> Result<PageStats, CoreError>
where
    F: FnMut(Ticket),
{
    let mut stats = PageStats::default();
    let mut page: u32 = 1;

    loop {
        if page > MAX_PAGES {
            return Err(CoreError::Internal(format!(
                "페이지 상한({MAX_PAGES}) 초과, 서버가 빈 페이지를 반환하지 않음"
            )));
        }

        let tickets = source.fetch_page(query, page).await?;
        if tickets.is_empty() {
            debug!("페이지 {page}: 비어 있음, 순회 종료");
            break;
        }

        stats.pages += 1;
        stats.tickets += tickets.len() as u64;
        for ticket in tickets {
            on_ticket(ticket);
        }
        page += 1;
    }

    info!(
        "{} 티켓 {}개 수신 ({}페이지)",
        query.state, stats.tickets, stats.pages
    );
    Ok(stats)
}
