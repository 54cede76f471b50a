//! 월 버킷과 리포트 윈도우.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use super::time::format_timestamp;

/// UTC 달력 월의 첫 순간으로 절삭된 그룹 키
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket(DateTime<Utc>);

impl MonthBucket {
    /// 연/월로 생성 (월은 1-12)
    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .map(Self)
    }

    /// 타임스탬프가 속한 월
    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        // 1일 00:00:00은 항상 유효
        Self::from_ym(dt.year(), dt.month()).unwrap_or(Self(*dt))
    }

    /// `YYYY-MM`, `YYYY-MM-DD`, RFC 3339 문자열의 앞 7자로 월 파싱
    pub fn parse_month(raw: &str) -> Option<Self> {
        let head = raw.trim().get(..7)?;
        let (year, month) = head.split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        Self::from_ym(year.parse().ok()?, month.parse().ok()?)
    }

    /// 월 시작 시각
    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    /// 다음 달
    pub fn succ(&self) -> Self {
        let (year, month) = if self.0.month() == 12 {
            (self.0.year() + 1, 1)
        } else {
            (self.0.year(), self.0.month() + 1)
        };
        Self::from_ym(year, month).unwrap_or(*self)
    }

    /// `first`부터 `last`까지 (양끝 포함) 모든 월
    pub fn range_inclusive(first: MonthBucket, last: MonthBucket) -> Vec<MonthBucket> {
        let mut months = Vec::new();
        let mut current = first;
        while current <= last {
            months.push(current);
            let next = current.succ();
            if next == current {
                break;
            }
            current = next;
        }
        months
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_timestamp(&self.0))
    }
}

impl Serialize for MonthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 리포트 윈도우: 대상 연도 1월 1일부터 `min(now, 다음 해 1월 1일)`까지 (양끝 포함)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    /// 윈도우 시작
    pub start: DateTime<Utc>,
    /// 윈도우 끝
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// 대상 연도와 현재 시각으로 윈도우 생성
    pub fn for_year(year: i32, now: DateTime<Utc>) -> Option<Self> {
        let start = MonthBucket::from_ym(year, 1)?.start();
        let next_year = MonthBucket::from_ym(year + 1, 1)?.start();
        Some(Self {
            start,
            end: now.min(next_year),
        })
    }

    /// 타임스탬프가 윈도우에 속하는지
    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        *dt >= self.start && *dt <= self.end
    }

    /// 윈도우 시작 연도
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// 윈도우가 걸치는 모든 월 (윈도우 끝이 시작보다 앞서면 빈 목록)
    pub fn months(&self) -> Vec<MonthBucket> {
        if self.end < self.start {
            return Vec::new();
        }
        let first = MonthBucket::from_datetime(&self.start);
        let mut last = MonthBucket::from_datetime(&self.end);
        // 다음 해 1월 1일 00:00:00 정각은 대상 연도에 월을 추가하지 않는다
        if last.start() == self.end && last > first {
            last = MonthBucket::from_datetime(&(self.end - chrono::Duration::seconds(1)));
        }
        MonthBucket::range_inclusive(first, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::parse_timestamp;

    fn ts(raw: &str) -> DateTime<Utc> {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn bucket_truncates_to_month_start() {
        let bucket = MonthBucket::from_datetime(&ts("2025-03-17T13:45:10Z"));
        assert_eq!(bucket.to_string(), "2025-03-01T00:00:00Z");
    }

    #[test]
    fn parse_month_accepts_common_forms() {
        let expected = MonthBucket::from_ym(2025, 4).unwrap();
        assert_eq!(MonthBucket::parse_month("2025-04"), Some(expected));
        assert_eq!(MonthBucket::parse_month("2025-04-30"), Some(expected));
        assert_eq!(MonthBucket::parse_month(" 2025-04-01T00:00:00Z"), Some(expected));
    }

    #[test]
    fn parse_month_rejects_bad_input() {
        assert!(MonthBucket::parse_month("2025").is_none());
        assert!(MonthBucket::parse_month("2025-13").is_none());
        assert!(MonthBucket::parse_month("April 2025").is_none());
        assert!(MonthBucket::parse_month("").is_none());
    }

    #[test]
    fn succ_rolls_over_year() {
        let dec = MonthBucket::from_ym(2025, 12).unwrap();
        assert_eq!(dec.succ(), MonthBucket::from_ym(2026, 1).unwrap());
    }

    #[test]
    fn range_is_inclusive_and_ordered() {
        let months = MonthBucket::range_inclusive(
            MonthBucket::from_ym(2025, 11).unwrap(),
            MonthBucket::from_ym(2026, 2).unwrap(),
        );
        let rendered: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "2025-11-01T00:00:00Z",
                "2025-12-01T00:00:00Z",
                "2026-01-01T00:00:00Z",
                "2026-02-01T00:00:00Z",
            ]
        );
    }

    #[test]
    fn window_for_past_year_ends_at_next_year() {
        let window = ReportWindow::for_year(2025, ts("2026-10-18T08:00:00Z")).unwrap();
        assert_eq!(window.start, ts("2025-01-01T00:00:00Z"));
        assert_eq!(window.end, ts("2026-01-01T00:00:00Z"));
        assert_eq!(window.months().len(), 12);
        assert!(window.contains(&ts("2025-12-31T23:59:59Z")));
        assert!(!window.contains(&ts("2024-12-31T23:59:59Z")));
        assert!(!window.contains(&ts("2026-01-01T00:00:01Z")));
    }

    #[test]
    fn window_for_current_year_ends_now() {
        let now = ts("2026-03-05T12:00:00Z");
        let window = ReportWindow::for_year(2026, now).unwrap();
        assert_eq!(window.end, now);
        assert_eq!(window.months().len(), 3);
        assert!(!window.contains(&ts("2026-03-05T12:00:01Z")));
    }

    #[test]
    fn window_for_future_year_is_empty() {
        let window = ReportWindow::for_year(2027, ts("2026-03-05T12:00:00Z")).unwrap();
        assert!(window.months().is_empty());
    }
}
