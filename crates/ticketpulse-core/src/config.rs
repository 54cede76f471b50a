//! 작업 설정 구조체.
//!
//! 티켓 API, 대시보드 푸시, 리포트 키/집계 정책, CSAT, 재시도 정책을 정의한다.
//! `config` crate를 통해 기본값 → 설정 파일 → 환경변수 순으로 로드된다.
//! 자격증명은 별도의 [`Credentials`]로 환경변수에서만 읽는다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::ticket::ResolutionAnchor;

/// 최상위 작업 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 티켓 API 설정
    #[serde(default)]
    pub source: SourceConfig,
    /// 대시보드 푸시 설정
    #[serde(default)]
    pub push: PushConfig,
    /// 리포트 집계/키 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// CSAT 설정
    #[serde(default)]
    pub csat: CsatConfig,
    /// HTTP 재시도 정책
    #[serde(default)]
    pub retry: RetryConfig,
}

// ============================================================
// 티켓 API 설정
// ============================================================

/// 티켓 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// API 기본 URL 오버라이드 (미지정 시 사이트 식별자에서 유도)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// 페이지 크기
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_source_timeout_secs")]
    pub request_timeout_secs: u64,
    /// User-Agent 헤더
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            per_page: default_per_page(),
            request_timeout_secs: default_source_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourceConfig {
    /// 사이트 식별자로부터 API 기본 URL 결정
    pub fn resolve_base_url(&self, site: &str) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{site}.enchant.com/api/v1"),
        }
    }
}

fn default_per_page() -> u32 {
    100
}

fn default_source_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("ticketpulse/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// 대시보드 푸시 설정
// ============================================================

/// 대시보드 푸시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// 푸시 엔드포인트
    #[serde(default = "default_push_url")]
    pub url: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_push_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: default_push_url(),
            request_timeout_secs: default_push_timeout_secs(),
        }
    }
}

fn default_push_url() -> String {
    "https://push.databox.com/data".to_string()
}

fn default_push_timeout_secs() -> u64 {
    45
}

// ============================================================
// 리포트 설정
// ============================================================

/// 리포트 집계/키 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 지표 키 접두어
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// 대상 연도 (미지정 시 현재 UTC 연도)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// 해결 기준 타임스탬프
    #[serde(default)]
    pub anchor: ResolutionAnchor,
    /// 월별 해결 건수를 윈도우 전체 월에 대해 0으로 채울지 여부
    #[serde(default)]
    pub zero_fill_months: bool,
    /// 생성 월 기준 건수 시리즈 포함 여부
    #[serde(default)]
    pub include_created_series: bool,
    /// 상위 태그 개수
    #[serde(default = "default_top_tags")]
    pub top_tags: usize,
    /// 집계에서 제외할 태그 (대소문자 구분)
    #[serde(default = "default_excluded_tags")]
    pub excluded_tags: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            year: None,
            anchor: ResolutionAnchor::default(),
            zero_fill_months: false,
            include_created_series: false,
            top_tags: default_top_tags(),
            excluded_tags: default_excluded_tags(),
        }
    }
}

fn default_key_prefix() -> String {
    "enchant".to_string()
}

fn default_top_tags() -> usize {
    10
}

fn default_excluded_tags() -> Vec<String> {
    vec!["SU".to_string(), "Core Support".to_string()]
}

// ============================================================
// CSAT 설정
// ============================================================

/// CSAT API 설정 (CSV 경로는 [`Credentials::csat_csv`]로 지정)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsatConfig {
    /// 만족도 API 조회 활성화
    #[serde(default)]
    pub api_enabled: bool,
    /// 만족도 API 경로 (티켓 API 기본 URL 기준)
    #[serde(default = "default_csat_api_path")]
    pub api_path: String,
}

impl Default for CsatConfig {
    fn default() -> Self {
        Self {
            api_enabled: false,
            api_path: default_csat_api_path(),
        }
    }
}

fn default_csat_api_path() -> String {
    "/satisfaction_ratings".to_string()
}

// ============================================================
// 재시도 설정
// ============================================================

/// HTTP 재시도 정책 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 지수 백오프 기본 지연 (밀리초)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// 백오프 상한 (밀리초)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// 429 응답에 대기 힌트가 없을 때 대기 시간 (초)
    #[serde(default = "default_rate_limit_fallback_secs")]
    pub rate_limit_fallback_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            rate_limit_fallback_secs: default_rate_limit_fallback_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    6
}

fn default_base_delay_ms() -> u64 {
    1_200
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_rate_limit_fallback_secs() -> u64 {
    2
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            source: SourceConfig::default(),
            push: PushConfig::default(),
            report: ReportConfig::default(),
            csat: CsatConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// 티켓/CSAT API 요청 타임아웃
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source.request_timeout_secs)
    }

    /// 푸시 요청 타임아웃
    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push.request_timeout_secs)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.source.per_page == 0 {
            return Err(CoreError::Validation {
                field: "source.per_page".to_string(),
                message: "1 이상이어야 함".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(CoreError::Validation {
                field: "retry.max_attempts".to_string(),
                message: "1 이상이어야 함".to_string(),
            });
        }
        if self.report.key_prefix.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "report.key_prefix".to_string(),
                message: "비어 있을 수 없음".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================
// 자격증명
// ============================================================

/// 사이트 식별자 환경변수
pub const ENV_SITE: &str = "ENCHANT_SITE";
/// 티켓 API 토큰 환경변수
pub const ENV_SOURCE_TOKEN: &str = "ENCHANT_TOKEN";
/// 대시보드 푸시 토큰 환경변수
pub const ENV_PUSH_TOKEN: &str = "DATABOX_TOKEN";
/// CSAT CSV 경로 환경변수 (선택)
pub const ENV_CSAT_CSV: &str = "CSAT_CSV";

/// 환경변수에서 읽는 자격증명
#[derive(Clone)]
pub struct Credentials {
    /// 티켓 API 사이트 식별자 (예: "carebit")
    pub site: String,
    /// 티켓 API 토큰 (Bearer)
    pub source_token: String,
    /// 대시보드 푸시 토큰 (Basic auth 사용자명)
    pub push_token: String,
    /// CSAT CSV 경로
    pub csat_csv: Option<PathBuf>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("site", &self.site)
            .field("source_token", &"***")
            .field("push_token", &"***")
            .field("csat_csv", &self.csat_csv)
            .finish()
    }
}

impl Credentials {
    /// 프로세스 환경변수에서 로드
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 조회 함수로부터 로드 (필수값 누락 시 설정 에러)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, CoreError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CoreError::Config(format!("필수 환경변수 누락: {key}")))
        };

        let csat_csv = lookup(ENV_CSAT_CSV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            site: required(ENV_SITE)?,
            source_token: required(ENV_SOURCE_TOKEN)?,
            push_token: required(ENV_PUSH_TOKEN)?,
            csat_csv,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn credentials_load_all_values() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (ENV_SITE, "carebit"),
            (ENV_SOURCE_TOKEN, "src"),
            (ENV_PUSH_TOKEN, "dst"),
            (ENV_CSAT_CSV, " data/happiness.csv "),
        ]))
        .unwrap();
        assert_eq!(creds.site, "carebit");
        assert_eq!(creds.csat_csv, Some(PathBuf::from("data/happiness.csv")));
    }

    #[test]
    fn missing_required_value_is_config_error() {
        let err = Credentials::from_lookup(lookup_from(&[
            (ENV_SITE, "carebit"),
            (ENV_PUSH_TOKEN, "dst"),
        ]))
        .unwrap_err();
        assert!(matches!(err, CoreError::Config(ref m) if m.contains(ENV_SOURCE_TOKEN)));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let result = Credentials::from_lookup(lookup_from(&[
            (ENV_SITE, "  "),
            (ENV_SOURCE_TOKEN, "src"),
            (ENV_PUSH_TOKEN, "dst"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn empty_csv_path_is_none() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (ENV_SITE, "carebit"),
            (ENV_SOURCE_TOKEN, "src"),
            (ENV_PUSH_TOKEN, "dst"),
            (ENV_CSAT_CSV, ""),
        ]))
        .unwrap();
        assert!(creds.csat_csv.is_none());
    }

    #[test]
    fn debug_redacts_tokens() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (ENV_SITE, "carebit"),
            (ENV_SOURCE_TOKEN, "secret-src"),
            (ENV_PUSH_TOKEN, "secret-dst"),
        ]))
        .unwrap();
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("secret"));
    }

    #[test]
    fn base_url_derived_from_site() {
        let source = SourceConfig::default();
        assert_eq!(
            source.resolve_base_url("carebit"),
            "https://carebit.enchant.com/api/v1"
        );
        let overridden = SourceConfig {
            base_url: Some("http://127.0.0.1:1234/api/v1/".to_string()),
            ..SourceConfig::default()
        };
        assert_eq!(
            overridden.resolve_base_url("ignored"),
            "http://127.0.0.1:1234/api/v1"
        );
    }

    #[test]
    fn validate_rejects_zero_page_size() {
        let mut config = AppConfig::default_config();
        config.source.per_page = 0;
        assert!(config.validate().is_err());
        assert!(AppConfig::default_config().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"report":{"zero_fill_months":true,"anchor":"closed_at"}}"#)
                .unwrap();
        assert!(config.report.zero_fill_months);
        assert_eq!(config.report.anchor, ResolutionAnchor::ClosedAt);
        assert_eq!(config.report.top_tags, 10);
        assert_eq!(config.push.url, "https://push.databox.com/data");
    }
}
