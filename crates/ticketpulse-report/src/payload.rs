//! 집계 결과 → 지표 레코드 목록.
//!
//! 출력 순서는 고정: 스칼라 → 상위 태그 → 월별 시계열 (각 시계열은 시간순).

use std::collections::BTreeSet;
use ticketpulse_core::models::csat::CsatSummary;
use ticketpulse_core::models::metric::{MetricRecord, MetricValue};
use ticketpulse_core::models::month::{MonthBucket, ReportWindow};

use crate::aggregator::ReportAggregate;
use crate::tags::{slugify, MAX_TOP_TAGS};

/// 페이로드 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSettings {
    /// 지표 키 접두사
    pub key_prefix: String,
    /// 대상 연도 (연간 키에 들어감)
    pub year: i32,
    /// 상위 태그 개수 (최대 10)
    pub top_tags: usize,
    /// 윈도우 전체 월을 0으로 채움
    pub zero_fill_months: bool,
    /// 생성 월 시계열 추가
    pub include_created_series: bool,
}

impl PayloadSettings {
    pub fn new(key_prefix: impl Into<String>, year: i32) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            year,
            top_tags: MAX_TOP_TAGS,
            zero_fill_months: false,
            include_created_series: false,
        }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.key_prefix)
    }

    pub fn total_key(&self) -> String {
        self.key(&format!("resolved_{}_total", self.year))
    }

    pub fn average_minutes_key(&self) -> String {
        self.key(&format!("resolution_minutes_avg_{}", self.year))
    }

    pub fn csat_average_key(&self) -> String {
        self.key(&format!("csat_avg_{}", self.year))
    }

    pub fn tag_key(&self, tag: &str) -> String {
        self.key(&format!("tag_{}_{}_count", slugify(tag), self.year))
    }

    pub fn resolved_monthly_key(&self) -> String {
        self.key("resolved_monthly")
    }

    pub fn average_minutes_monthly_key(&self) -> String {
        self.key("resolution_minutes_avg_monthly")
    }

    pub fn csat_monthly_key(&self) -> String {
        self.key("csat_avg_monthly")
    }

    pub fn created_monthly_key(&self) -> String {
        self.key("created_monthly")
    }
}

/// 레코드 목록 생성기
pub struct PayloadBuilder<'a> {
    settings: &'a PayloadSettings,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(settings: &'a PayloadSettings) -> Self {
        Self { settings }
    }

    /// 고정 순서로 레코드 생성
    ///
    /// 1. 연간 해결 건수  2. 연간 평균 해결 시간  3. 연간 CSAT (있을 때)
    /// 4. 상위 태그 건수  5. 월별 해결 건수  6. 월별 평균 해결 시간
    /// 7. 월별 CSAT (있을 때)  8. 월별 생성 건수 (설정 시)
    pub fn build(
        &self,
        aggregate: &ReportAggregate,
        csat: Option<&CsatSummary>,
        window: &ReportWindow,
    ) -> Vec<MetricRecord> {
        let s = self.settings;
        let mut records = vec![
            MetricRecord::scalar(s.total_key(), MetricValue::Count(aggregate.total_resolved)),
            MetricRecord::scalar(
                s.average_minutes_key(),
                MetricValue::Measure(aggregate.year_average_minutes()),
            ),
        ];

        if let Some(csat) = csat {
            records.push(MetricRecord::scalar(
                s.csat_average_key(),
                MetricValue::Measure(csat.yearly_average),
            ));
        }

        for (tag, count) in aggregate.top_tags(s.top_tags) {
            records.push(MetricRecord::scalar(s.tag_key(tag), MetricValue::Count(count)));
        }

        let resolved_key = s.resolved_monthly_key();
        for month in self.resolved_months(aggregate, window) {
            let count = aggregate.resolved_by_month.get(&month).copied().unwrap_or(0);
            records.push(MetricRecord::point(
                resolved_key.as_str(),
                MetricValue::Count(count),
                month,
            ));
        }

        let avg_key = s.average_minutes_monthly_key();
        for (month, avg) in aggregate.monthly_average_minutes() {
            records.push(MetricRecord::point(
                avg_key.as_str(),
                MetricValue::Measure(avg),
                month,
            ));
        }

        if let Some(csat) = csat {
            let csat_key = s.csat_monthly_key();
            for (month, avg) in &csat.monthly {
                records.push(MetricRecord::point(
                    csat_key.as_str(),
                    MetricValue::Measure(*avg),
                    *month,
                ));
            }
        }

        if s.include_created_series {
            let created_key = s.created_monthly_key();
            for (month, count) in &aggregate.created_by_month {
                records.push(MetricRecord::point(
                    created_key.as_str(),
                    MetricValue::Count(*count),
                    *month,
                ));
            }
        }

        records
    }

    /// 월별 해결 건수를 낼 월 목록 (0 채우기 시 윈도우 전체 월 포함)
    fn resolved_months(&self, aggregate: &ReportAggregate, window: &ReportWindow) -> BTreeSet<MonthBucket> {
        let mut months: BTreeSet<MonthBucket> = aggregate.resolved_by_month.keys().copied().collect();
        if self.settings.zero_fill_months {
            months.extend(window.months());
        }
        months
    }
}
