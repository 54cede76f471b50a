//! # ticketpulse-core
//!
//! 티켓 지표 배치 작업의 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 도메인 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`]: 헥사고날 아키텍처 포트 인터페이스 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 작업 설정 구조체

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

#[cfg(test)]
mod tests {
    use crate::models::metric::{MetricRecord, MetricValue};
    use crate::models::month::MonthBucket;

    #[test]
    fn scalar_record_omits_date() {
        let record = MetricRecord::scalar("enchant_resolved_2025_total", MetricValue::Count(2));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"key": "enchant_resolved_2025_total", "value": 2})
        );
    }

    #[test]
    fn series_record_renders_month_date() {
        let month = MonthBucket::from_ym(2025, 2).unwrap();
        let record =
            MetricRecord::point("enchant_resolution_minutes_avg_monthly", MetricValue::Measure(10.0), month);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2025-02-01T00:00:00Z");
        assert_eq!(json["value"], 10.0);
    }

    #[test]
    fn config_defaults() {
        let config = crate::config::AppConfig::default_config();
        assert_eq!(config.source.per_page, 100);
        assert_eq!(config.report.key_prefix, "enchant");
        assert_eq!(config.report.top_tags, 10);
        assert!(!config.report.zero_fill_months);
        assert!(config.report.excluded_tags.contains(&"SU".to_string()));
        assert_eq!(config.retry.max_attempts, 6);
    }
}
