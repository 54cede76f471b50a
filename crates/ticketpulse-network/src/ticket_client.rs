//! 티켓 API 클라이언트.
//!
//! `TicketSource`, `TicketCounter` 포트 구현. Bearer 토큰 인증 + 재시도.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use ticketpulse_core::error::CoreError;
use ticketpulse_core::models::ticket::{Ticket, TicketState};
use ticketpulse_core::models::time::format_timestamp;
use ticketpulse_core::ports::ticket_source::{TicketCounter, TicketQuery, TicketSource};
use tracing::{debug, warn};
use url::Url;

use crate::retry::{send_with_retry, RetryPolicy};

/// 총 건수 응답 헤더
const TOTAL_COUNT_HEADERS: [&str; 2] = ["Total-Count", "X-Total-Count"];

/// 티켓 API 클라이언트: `TicketSource`/`TicketCounter` 포트 구현
pub struct EnchantClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    policy: RetryPolicy,
}

impl EnchantClient {
    /// 새 티켓 API 클라이언트 생성
    pub fn new(
        base_url: &str,
        token: &str,
        user_agent: &str,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            policy,
        })
    }

    /// API 기본 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `/tickets` URL + 쿼리 파라미터
    fn tickets_url(&self, params: &[(&str, String)]) -> Result<Url, CoreError> {
        Url::parse_with_params(&format!("{}/tickets", self.base_url), params)
            .map_err(|e| CoreError::Config(format!("잘못된 티켓 API URL: {e}")))
    }

    /// 페이지 조회 파라미터
    fn page_params(query: &TicketQuery, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("state", query.state.as_str().to_string())];
        if let Some(since) = &query.since {
            params.push(("since_updated_at", format_timestamp(since)));
        }
        if query.embed_labels {
            params.push(("embed", "labels".to_string()));
        }
        params.push(("per_page", query.per_page.to_string()));
        params.push(("page", page.to_string()));
        // 오래된 것부터 정렬해 페이지 경계를 고정
        params.push(("sort", "updated_at".to_string()));
        params
    }
}

/// 응답 본문을 티켓 목록으로 변환
///
/// 배열이 아니면 빈 페이지로 취급하고, 역직렬화 실패 항목은 건너뛴다.
pub fn parse_ticket_page(body: &str) -> Result<Vec<Ticket>, CoreError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| CoreError::Parse(format!("티켓 응답 파싱 실패: {e}")))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            warn!("티켓 응답이 배열이 아님, 빈 페이지로 처리: {}", shape_of(&other));
            return Ok(Vec::new());
        }
    };

    let total = items.len();
    let tickets: Vec<Ticket> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Ticket>(item) {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                warn!("티켓 항목 건너뜀: {e}");
                None
            }
        })
        .collect();

    if tickets.len() != total {
        debug!("티켓 {}/{}개 파싱", tickets.len(), total);
    }
    Ok(tickets)
}

fn shape_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[async_trait]
impl TicketSource for EnchantClient {
    async fn fetch_page(&self, query: &TicketQuery, page: u32) -> Result<Vec<Ticket>, CoreError> {
        let url = self.tickets_url(&Self::page_params(query, page))?;
        let label = format!("티켓 페이지 {page} 조회");

        let outcome = send_with_retry(&self.policy, &label, || {
            self.client.get(url.clone()).bearer_auth(&self.token)
        })
        .await?;

        let body = outcome
            .response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("티켓 응답 읽기 실패: {e}")))?;

        let tickets = parse_ticket_page(&body)?;
        debug!("페이지 {page}: {}개 티켓", tickets.len());
        Ok(tickets)
    }
}

#[async_trait]
impl TicketCounter for EnchantClient {
    async fn count_tickets(
        &self,
        state: TicketState,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64, CoreError> {
        let mut params = vec![
            ("state", state.as_str().to_string()),
            ("count", "true".to_string()),
            ("per_page", "1".to_string()),
        ];
        if let Some(since) = &since {
            params.push(("since_updated_at", format_timestamp(since)));
        }
        let url = self.tickets_url(&params)?;
        let label = format!("{state} 티켓 건수 조회");

        let outcome = send_with_retry(&self.policy, &label, || {
            self.client.get(url.clone()).bearer_auth(&self.token)
        })
        .await?;

        let headers = outcome.response.headers();
        let raw = TOTAL_COUNT_HEADERS
            .iter()
            .find_map(|name| headers.get(*name))
            .ok_or_else(|| CoreError::Parse(format!("{state} 건수 헤더 없음")))?;

        let count = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| CoreError::Parse(format!("{state} 건수 헤더 형식 오류: {raw:?}")))?;

        debug!("{state} 티켓 건수: {count}");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mockito::Matcher;
    use ticketpulse_core::models::time::parse_timestamp;

    fn client_for(server: &mockito::ServerGuard) -> EnchantClient {
        EnchantClient::new(
            &format!("{}/api/v1/", server.url()),
            "src-token",
            "ticketpulse-test",
            Duration::from_secs(5),
            RetryPolicy::immediate(3),
        )
        .unwrap()
    }

    fn closed_query() -> TicketQuery {
        TicketQuery::closed_since(parse_timestamp("2025-01-01T00:00:00Z").unwrap(), 100)
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = EnchantClient::new(
            "https://carebit.enchant.com/api/v1/",
            "t",
            "ua",
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://carebit.enchant.com/api/v1");
    }

    #[test]
    fn page_params_include_filters() {
        let params = EnchantClient::page_params(&closed_query(), 3);
        assert!(params.contains(&("state", "closed".to_string())));
        assert!(params.contains(&("since_updated_at", "2025-01-01T00:00:00Z".to_string())));
        assert!(params.contains(&("embed", "labels".to_string())));
        assert!(params.contains(&("per_page", "100".to_string())));
        assert!(params.contains(&("page", "3".to_string())));
    }

    #[test]
    fn non_array_body_is_empty_page() {
        let tickets = parse_ticket_page(r#"{"error":"nope"}"#).unwrap();
        assert!(tickets.is_empty());
    }

    #[test]
    fn non_object_item_is_skipped() {
        let tickets = parse_ticket_page(r#"[{"id":1,"state":"closed"},42,"oops",{"id":2}]"#).unwrap();
        assert_eq!(tickets.len(), 2);
    }

    #[test]
    fn mistyped_fields_keep_ticket_on_page() {
        let tickets = parse_ticket_page(
            r#"[
                {"id":1,"state":"closed","created_at":20250101,"updated_at":"2025-01-02T00:00:00Z"},
                {"id":2,"state":"closed","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-02T00:00:00Z","labels":"Bug"},
                {"id":3,"state":"closed","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-02T00:00:00Z","labels":{"name":"Bug"}},
                {"id":-4,"state":"closed","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-02T00:00:00Z"},
                {"id":5.5,"state":"closed","created_at":"2025-01-01T00:00:00Z","updated_at":"2025-01-02T00:00:00Z","labels":["UI"]}
            ]"#,
        )
        .unwrap();
        assert_eq!(tickets.len(), 5);
        assert!(tickets.iter().all(|t| t.is_closed()));
        assert!(tickets[0].created_time().is_none());
        assert_eq!(tickets[1].tag_names().count(), 0);
        assert_eq!(tickets[4].tag_names().collect::<Vec<_>>(), vec!["UI"]);
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert_matches!(parse_ticket_page("<html>"), Err(CoreError::Parse(_)));
    }

    #[tokio::test]
    async fn fetch_page_sends_filters_and_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tickets")
            .match_header("authorization", "Bearer src-token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "closed".into()),
                Matcher::UrlEncoded("since_updated_at".into(), "2025-01-01T00:00:00Z".into()),
                Matcher::UrlEncoded("embed".into(), "labels".into()),
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":1,"state":"closed","created_at":"2025-01-01T00:00:00Z",
                     "updated_at":"2025-01-01T01:30:00Z","labels":[{"name":"Bug"}]}]"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let tickets = client.fetch_page(&closed_query(), 1).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].tag_names().collect::<Vec<_>>(), vec!["Bug"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limited_page_is_retried_not_skipped() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/api/v1/tickets")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(429)
            .with_header("Rate-Limit-Reset", "0")
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/api/v1/tickets")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(r#"[{"id":7,"state":"closed"}]"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let tickets = client.fetch_page(&closed_query(), 2).await.unwrap();
        assert_eq!(tickets.len(), 1);
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tickets")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("invalid token")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.fetch_page(&closed_query(), 1).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn count_reads_total_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tickets")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "open".into()),
                Matcher::UrlEncoded("count".into(), "true".into()),
                Matcher::UrlEncoded("per_page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("Total-Count", "57")
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server);
        let count = client.count_tickets(TicketState::Open, None).await.unwrap();
        assert_eq!(count, 57);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn count_without_header_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/tickets")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.count_tickets(TicketState::Hold, None).await;
        assert_matches!(result, Err(CoreError::Parse(_)));
    }
}
