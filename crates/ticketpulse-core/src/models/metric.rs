//! 대시보드 지표 레코드.
//!
//! 푸시 API v2 배열 포맷의 단일 항목: `{key, value, date?}`.

use serde::Serialize;

use super::month::MonthBucket;

/// 지표 값: 건수는 JSON 정수, 평균은 JSON 실수로 직렬화
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// 건수
    Count(u64),
    /// 측정값 (평균 등)
    Measure(f64),
}

impl MetricValue {
    /// f64로 변환
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Count(n) => *n as f64,
            MetricValue::Measure(v) => *v,
        }
    }
}

/// 지표 레코드
///
/// `date`가 있으면 시계열 포인트, 없으면 스칼라/범주형 값.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    /// 지표 키
    pub key: String,
    /// 값
    pub value: MetricValue,
    /// 월 (시계열 포인트만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<MonthBucket>,
}

impl MetricRecord {
    /// 스칼라 레코드
    pub fn scalar(key: impl Into<String>, value: MetricValue) -> Self {
        Self {
            key: key.into(),
            value,
            date: None,
        }
    }

    /// 시계열 포인트
    pub fn point(key: impl Into<String>, value: MetricValue, month: MonthBucket) -> Self {
        Self {
            key: key.into(),
            value,
            date: Some(month),
        }
    }
}

/// 푸시 결과 (운영자 확인용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReceipt {
    /// 응답 상태 코드
    pub status: u16,
    /// 응답 본문
    pub body: String,
    /// 전송한 항목 수
    pub items: usize,
}
