//! 고객 만족도(CSAT) 요약.

use std::collections::BTreeMap;

use super::month::MonthBucket;
use super::time::round2;

/// CSAT 요약: 연간 평균과 월별 평균 (백분율, 0-100)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsatSummary {
    /// 연간 평균
    pub yearly_average: f64,
    /// 월별 평균 (데이터가 있는 달만)
    pub monthly: BTreeMap<MonthBucket, f64>,
}

/// 백분율 샘플을 모아 [`CsatSummary`]를 만드는 누산기
#[derive(Debug, Default)]
pub struct CsatAccumulator {
    sum: f64,
    count: usize,
    monthly: BTreeMap<MonthBucket, (f64, usize)>,
}

impl CsatAccumulator {
    /// 빈 누산기
    pub fn new() -> Self {
        Self::default()
    }

    /// 샘플 추가. 월을 모르면 연간 평균에만 반영된다.
    pub fn add(&mut self, percent: f64, month: Option<MonthBucket>) {
        self.sum += percent;
        self.count += 1;
        if let Some(month) = month {
            let entry = self.monthly.entry(month).or_insert((0.0, 0));
            entry.0 += percent;
            entry.1 += 1;
        }
    }

    /// 누적 샘플 수
    pub fn len(&self) -> usize {
        self.count
    }

    /// 샘플 없음
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// 요약 생성. 샘플이 없으면 `None`.
    pub fn finish(self) -> Option<CsatSummary> {
        if self.is_empty() {
            return None;
        }
        let monthly = self
            .monthly
            .into_iter()
            .map(|(month, (sum, n))| (month, round2(sum / n as f64)))
            .collect();
        Some(CsatSummary {
            yearly_average: round2(self.sum / self.count as f64),
            monthly,
        })
    }
}
