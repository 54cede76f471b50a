//! 타임스탬프 헬퍼.
//!
//! 티켓 API 타임스탬프는 `Z`로 끝나는 ISO-8601 UTC 문자열이다.

use chrono::{DateTime, SecondsFormat, Utc};

/// ISO-8601 타임스탬프 파싱. 비어 있거나 파싱 불가하면 `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `2025-01-01T00:00:00Z` 형식으로 렌더링
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// 두 타임스탬프 사이의 분 단위 해결 시간 (음수는 0으로 고정)
pub fn resolution_minutes(created_at: &str, anchor_at: &str) -> Option<f64> {
    let created = parse_timestamp(created_at)?;
    let anchor = parse_timestamp(anchor_at)?;
    let minutes = (anchor - created).num_seconds() as f64 / 60.0;
    Some(minutes.max(0.0))
}

/// 소수점 둘째 자리 반올림
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
