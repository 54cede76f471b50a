//! 대시보드 푸시 클라이언트.
//!
//! `MetricSink` 포트 구현. 토큰 Basic 인증, v2 Accept 헤더로 배열 포맷 선택.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use ticketpulse_core::error::CoreError;
use ticketpulse_core::models::metric::{MetricRecord, PushReceipt};
use ticketpulse_core::ports::metric_sink::MetricSink;
use tracing::{debug, info};

use crate::retry::{send_with_retry, RetryPolicy};

/// v2 배열 포맷 Accept 헤더
pub const DATABOX_V2_ACCEPT: &str = "application/vnd.databox.v2+json";

/// 대시보드 푸시 클라이언트: `MetricSink` 포트 구현
pub struct DataboxClient {
    client: reqwest::Client,
    url: String,
    token: String,
    policy: RetryPolicy,
}

impl DataboxClient {
    /// 새 푸시 클라이언트 생성
    pub fn new(
        url: &str,
        token: &str,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            token: token.to_string(),
            policy,
        })
    }

    /// JSON 본문 하나를 POST
    async fn post_json<T>(&self, body: &T, items: usize) -> Result<PushReceipt, CoreError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let outcome = send_with_retry(&self.policy, "대시보드 푸시", || {
            self.client
                .post(&self.url)
                .basic_auth(&self.token, Some(""))
                .header(reqwest::header::ACCEPT, DATABOX_V2_ACCEPT)
                .json(body)
        })
        .await?;

        let status = outcome.response.status().as_u16();
        let text = outcome
            .response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("푸시 응답 읽기 실패: {e}")))?;

        info!("푸시 응답 {status}: {text}");
        Ok(PushReceipt {
            status,
            body: text,
            items,
        })
    }
}

#[async_trait]
impl MetricSink for DataboxClient {
    async fn push_records(&self, records: &[MetricRecord]) -> Result<PushReceipt, CoreError> {
        debug!("지표 {}개 푸시", records.len());
        self.post_json(records, records.len()).await
    }

    async fn push_counters(
        &self,
        counters: &BTreeMap<String, u64>,
    ) -> Result<PushReceipt, CoreError> {
        debug!("카운터 {}개 푸시", counters.len());
        self.post_json(counters, counters.len()).await
    }
}
