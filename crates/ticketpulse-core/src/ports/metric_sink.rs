//! 대시보드 푸시 포트.
//!
//! 구현: `ticketpulse-network` crate (reqwest)

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::models::metric::{MetricRecord, PushReceipt};

/// 대시보드 수집 API
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// 지표 레코드 배열을 한 번의 요청으로 전송 (전부 성공 또는 실패)
    async fn push_records(&self, records: &[MetricRecord]) -> Result<PushReceipt, CoreError>;

    /// 이름 붙은 카운터 객체 하나를 전송 (count-only 변형)
    async fn push_counters(
        &self,
        counters: &BTreeMap<String, u64>,
    ) -> Result<PushReceipt, CoreError>;
}
