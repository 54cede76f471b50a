//! 태그 빈도표, 상위 태그 선택, 태그 슬러그.

use std::collections::BTreeMap;

/// 상위 태그 최대 개수
pub const MAX_TOP_TAGS: usize = 10;

/// 슬러그 최대 길이
const SLUG_MAX_LEN: usize = 60;

/// 슬러그가 비었을 때 대체 이름
const SLUG_FALLBACK: &str = "tag";

/// 태그 이름(대소문자 유지) → 출현 횟수
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCounts {
    counts: BTreeMap<String, u64>,
}

impl TagCounts {
    /// 빈 빈도표
    pub fn new() -> Self {
        Self::default()
    }

    /// 태그 한 번 집계
    pub fn increment(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    /// 태그 출현 횟수
    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// 서로 다른 태그 수
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// 비어 있음
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 빈도 내림차순, 동률은 이름 오름차순으로 최대 `limit`개 (상한 10)
    ///
    /// 이름 기준 동률 처리로 페이지 조회 순서와 무관하게 결과가 결정된다.
    pub fn top(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(limit.min(MAX_TOP_TAGS));
        ranked
    }
}

/// 태그 이름 → 키 안전 슬러그
///
/// 소문자화 → `[a-z0-9]` 외 문자 연속 구간을 `_` 하나로 → 양끝 `_` 제거 → 60자 절단.
/// 결과가 비면 `tag`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_sep = false;
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch);
        } else {
            pending_sep = true;
        }
    }

    // ASCII만 남으므로 바이트 절단이 안전
    slug.truncate(SLUG_MAX_LEN);
    let trimmed = slug.trim_matches('_');
    if trimmed.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        trimmed.to_string()
    }
}
