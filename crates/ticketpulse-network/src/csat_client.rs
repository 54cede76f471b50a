//! 만족도(CSAT) API 클라이언트.
//!
//! 응답 형태가 일정하지 않아 필드 존재 여부로 닫힌 변형 집합 [`CsatResponse`]를
//! 판정한다. 인식 불가 형태, 401/403/404는 CSAT 생략으로 처리한다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use ticketpulse_core::error::CoreError;
use ticketpulse_core::models::csat::{CsatAccumulator, CsatSummary};
use ticketpulse_core::models::month::{MonthBucket, ReportWindow};
use ticketpulse_core::models::time::{format_timestamp, parse_timestamp, round2};
use ticketpulse_core::ports::csat_source::CsatSource;
use tracing::{debug, info, warn};
use url::Url;

use crate::retry::{send_with_retry, RetryPolicy};

/// 평균값 필드 후보
const AVERAGE_FIELDS: [&str; 4] = ["average", "avg", "csat_percent", "csat"];
/// 이벤트 목록을 감싸는 필드 후보
const LIST_FIELDS: [&str; 3] = ["ratings", "data", "results"];
/// 백분율 필드 후보 (0-100)
const PERCENT_FIELDS: [&str; 2] = ["percent", "csat_percent"];
/// 점수 필드 후보 (1-5)
const SCORE_FIELDS: [&str; 2] = ["score", "rating"];
/// 1-5 점수를 백분율로 바꾸는 배수
const SCORE_TO_PERCENT: f64 = 20.0;
/// 엔드포인트 비활성/미발견으로 보는 상태 코드
const ABSENT_STATUSES: [u16; 3] = [401, 403, 404];

/// 만족도 API 응답 형태
#[derive(Debug, Clone, PartialEq)]
pub enum CsatResponse {
    /// 평균 백분율 하나
    Average(f64),
    /// 평가 이벤트 목록
    Ratings(Vec<RatedEvent>),
    /// 인식할 수 없는 형태 (CSAT 없음으로 처리)
    Unrecognized,
}

/// 평가 이벤트 하나
#[derive(Debug, Clone, PartialEq)]
pub struct RatedEvent {
    /// 백분율 (형식 오류/범위 밖이면 `None`)
    pub percent: Option<f64>,
    /// 평가 시각
    pub rated_at: Option<DateTime<Utc>>,
}

/// 숫자 또는 숫자 문자열
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn first_number(map: &serde_json::Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields.iter().find_map(|f| map.get(*f).and_then(number))
}

fn valid_percent(v: f64) -> Option<f64> {
    (0.0..=100.0).contains(&v).then_some(v)
}

impl RatedEvent {
    /// 이벤트 객체 해석. 백분율이 우선이고, 없으면 1-5 점수를 ×20 한다.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self {
                percent: None,
                rated_at: None,
            };
        };

        let percent = first_number(map, &PERCENT_FIELDS)
            .and_then(valid_percent)
            .or_else(|| {
                first_number(map, &SCORE_FIELDS)
                    .filter(|s| (1.0..=5.0).contains(s))
                    .map(|s| s * SCORE_TO_PERCENT)
            });

        let rated_at = map
            .get("created_at")
            .or_else(|| map.get("rated_at"))
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        Self { percent, rated_at }
    }
}

impl CsatResponse {
    /// 필드 존재 여부로 응답 형태 판정
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(_) => number(value)
                .and_then(valid_percent)
                .map(CsatResponse::Average)
                .unwrap_or(CsatResponse::Unrecognized),
            Value::Array(items) => {
                CsatResponse::Ratings(items.iter().map(RatedEvent::from_json).collect())
            }
            Value::Object(map) => {
                if let Some(avg) = first_number(map, &AVERAGE_FIELDS) {
                    return valid_percent(avg)
                        .map(CsatResponse::Average)
                        .unwrap_or(CsatResponse::Unrecognized);
                }
                LIST_FIELDS
                    .iter()
                    .find_map(|f| map.get(*f).and_then(Value::as_array))
                    .map(|items| {
                        CsatResponse::Ratings(items.iter().map(RatedEvent::from_json).collect())
                    })
                    .unwrap_or(CsatResponse::Unrecognized)
            }
            _ => CsatResponse::Unrecognized,
        }
    }

    /// 윈도우 기준 CSAT 요약. 데이터가 없으면 `None`.
    pub fn into_summary(self, window: &ReportWindow) -> Option<CsatSummary> {
        match self {
            CsatResponse::Average(avg) => Some(CsatSummary {
                yearly_average: round2(avg),
                monthly: Default::default(),
            }),
            CsatResponse::Ratings(events) => {
                let mut acc = CsatAccumulator::new();
                let mut skipped = 0usize;
                for event in events {
                    let Some(percent) = event.percent else {
                        skipped += 1;
                        continue;
                    };
                    match event.rated_at {
                        Some(at) if !window.contains(&at) => skipped += 1,
                        Some(at) => acc.add(percent, Some(MonthBucket::from_datetime(&at))),
                        None => acc.add(percent, None),
                    }
                }
                if skipped > 0 {
                    debug!("CSAT 이벤트 {skipped}개 제외 (형식 오류 또는 윈도우 밖)");
                }
                acc.finish()
            }
            CsatResponse::Unrecognized => None,
        }
    }
}

/// 만족도 API 클라이언트: `CsatSource` 포트 구현
pub struct HttpCsatSource {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    policy: RetryPolicy,
}

impl HttpCsatSource {
    /// 새 만족도 API 클라이언트 생성
    pub fn new(
        base_url: &str,
        path: &str,
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
            endpoint: format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            token: token.to_string(),
            policy,
        })
    }
}

#[async_trait]
impl CsatSource for HttpCsatSource {
    fn name(&self) -> &'static str {
        "satisfaction-api"
    }

    async fn load(&self, window: &ReportWindow) -> Result<Option<CsatSummary>, CoreError> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("since", format_timestamp(&window.start)),
                ("until", format_timestamp(&window.end)),
            ],
        )
        .map_err(|e| CoreError::Config(format!("잘못된 만족도 API URL: {e}")))?;

        let outcome = match send_with_retry(&self.policy, "만족도 조회", || {
            self.client.get(url.clone()).bearer_auth(&self.token)
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) if e.status().is_some_and(|s| ABSENT_STATUSES.contains(&s)) => {
                info!("만족도 API 사용 불가, CSAT 생략: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let body = outcome
            .response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("만족도 응답 읽기 실패: {e}")))?;

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                warn!("만족도 응답 JSON 아님, CSAT 생략: {e}");
                return Ok(None);
            }
        };

        let response = CsatResponse::from_json(&value);
        if response == CsatResponse::Unrecognized {
            warn!("만족도 응답 형태 인식 불가, CSAT 생략");
        }
        Ok(response.into_summary(window))
    }
}
