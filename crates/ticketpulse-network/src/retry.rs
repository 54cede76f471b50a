//! HTTP 재시도 헬퍼.
//!
//! "HTTP 호출 1회"를 감싸는 유한 루프. 상태 코드를 {성공, 재시도, 치명}으로
//! 분류하고, 대기 시간은 [`RetryPolicy::delay_for`] 한 곳에서 계산한다.
//! reqwest 내부 재시도는 사용하지 않는다.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;
use ticketpulse_core::config::RetryConfig;
use ticketpulse_core::error::CoreError;
use tracing::{debug, warn};

/// 서버 대기 힌트 헤더 (초 단위 정수)
const HINT_HEADERS: [&str; 2] = ["Retry-After", "Rate-Limit-Reset"];

/// 지수 백오프 최대 지수
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// 응답 상태 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 2xx
    Success,
    /// 429, 500, 502, 503, 504
    Retry,
    /// 그 외 (재시도 없이 실패)
    Fatal,
}

/// 상태 코드 분류
pub fn classify(status: StatusCode) -> Disposition {
    if status.is_success() {
        return Disposition::Success;
    }
    match status.as_u16() {
        429 | 500 | 502 | 503 | 504 => Disposition::Retry,
        _ => Disposition::Fatal,
    }
}

/// `Retry-After` / `Rate-Limit-Reset` 헤더의 대기 시간
pub fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    HINT_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse::<u64>().ok().map(Duration::from_secs)
    })
}

/// 재시도 정책
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 지수 백오프 기본 지연
    pub base_delay: Duration,
    /// 백오프 상한
    pub max_delay: Duration,
    /// 힌트 없는 429의 대기 시간
    pub rate_limit_fallback: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// 설정에서 생성
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            rate_limit_fallback: Duration::from_secs(config.rate_limit_fallback_secs),
        }
    }

    /// 대기 없이 재시도하는 정책 (테스트/로컬용)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            rate_limit_fallback: Duration::ZERO,
        }
    }

    /// `attempt`번째(1부터) 실패 후의 지수 백오프
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// 재시도 전 대기 시간: 서버 힌트 > 429 기본값 > 지수 백오프
    ///
    /// 서버 힌트도 `max_delay`를 넘지 않는다.
    pub fn delay_for(
        &self,
        attempt: u32,
        status: Option<StatusCode>,
        hint: Option<Duration>,
    ) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_delay);
        }
        if status == Some(StatusCode::TOO_MANY_REQUESTS) {
            return self.rate_limit_fallback;
        }
        self.backoff(attempt)
    }
}

/// 재시도 결과
#[derive(Debug)]
pub struct RetryOutcome {
    /// 성공 응답
    pub response: reqwest::Response,
    /// 사용한 시도 횟수
    pub attempts: u32,
}

/// 재시도 가능한 전송 에러인지 (타임아웃, 연결 실패)
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// 요청 실행 + 재시도
///
/// `build`는 시도마다 새 요청을 만든다. 2xx면 응답을 반환하고,
/// 치명 상태 또는 재시도 소진 시 상태 코드와 본문을 담은 `CoreError::Http`를 반환한다.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    label: &str,
    build: F,
) -> Result<RetryOutcome, CoreError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let exhausted = attempt >= max_attempts;

        match build().send().await {
            Ok(resp) => {
                let status = resp.status();
                match classify(status) {
                    Disposition::Success => {
                        debug!("{label} 성공 (시도 {attempt}/{max_attempts}): {status}");
                        return Ok(RetryOutcome {
                            response: resp,
                            attempts: attempt,
                        });
                    }
                    Disposition::Retry if !exhausted => {
                        let hint = retry_after_hint(resp.headers());
                        let delay = policy.delay_for(attempt, Some(status), hint);
                        warn!(
                            "{label} 실패 (시도 {attempt}/{max_attempts}): {status}, {delay:?} 후 재시도"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    _ => {
                        let body = resp.text().await.unwrap_or_else(|e| {
                            warn!("응답 본문 읽기 실패: {e}");
                            String::new()
                        });
                        return Err(CoreError::Http {
                            status: status.as_u16(),
                            body,
                        });
                    }
                }
            }
            Err(e) if is_transient(&e) && !exhausted => {
                let delay = policy.backoff(attempt);
                warn!(
                    "{label} 전송 실패 (시도 {attempt}/{max_attempts}): {e}, {delay:?} 후 재시도"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(CoreError::Network(format!("{label} 요청 실패: {e}")));
            }
        }
    }
}
