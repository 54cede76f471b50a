//! 티켓 스트림 집계.
//!
//! 네트워크와 무관한 순수 로직. 관련 티켓(종료 상태 + 기준 시각이 윈도우 안)만
//! 합계, 해결 시간 목록, 태그 빈도, 월별 누산기에 반영한다.

use std::collections::{BTreeMap, BTreeSet};
use ticketpulse_core::models::month::{MonthBucket, ReportWindow};
use ticketpulse_core::models::ticket::{ResolutionAnchor, Ticket};
use ticketpulse_core::models::time::{resolution_minutes, round2};

use crate::tags::TagCounts;

/// 집계 설정
#[derive(Debug, Clone)]
pub struct AggregationSettings {
    /// 리포트 윈도우
    pub window: ReportWindow,
    /// 해결 기준 타임스탬프
    pub anchor: ResolutionAnchor,
    /// 집계에서 제외할 태그 (대소문자 구분)
    pub excluded_tags: BTreeSet<String>,
}

impl AggregationSettings {
    pub fn new<I, S>(window: ReportWindow, anchor: ResolutionAnchor, excluded_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            window,
            anchor,
            excluded_tags: excluded_tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// 월별 해결 시간 합/건수
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationStats {
    pub sum_minutes: f64,
    pub count: u64,
}

impl DurationStats {
    fn record(&mut self, minutes: f64) {
        self.sum_minutes += minutes;
        self.count += 1;
    }

    /// 평균 (소수 둘째 자리). 건수가 0이면 `None`.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| round2(self.sum_minutes / self.count as f64))
    }
}

/// 집계 결과
#[derive(Debug, Clone, Default)]
pub struct ReportAggregate {
    /// 관련 티켓 수
    pub total_resolved: u64,
    /// 계산 가능한 해결 시간 (분)
    pub durations: Vec<f64>,
    /// 태그 빈도 (제외 태그 없음)
    pub tag_counts: TagCounts,
    /// 생성 월별 건수
    pub created_by_month: BTreeMap<MonthBucket, u64>,
    /// 해결 월별 건수
    pub resolved_by_month: BTreeMap<MonthBucket, u64>,
    /// 해결 월별 해결 시간 합/건수
    pub duration_by_month: BTreeMap<MonthBucket, DurationStats>,
    /// 살펴본 티켓 수 (관련 여부 무관)
    pub tickets_seen: u64,
}

impl ReportAggregate {
    /// 연간 평균 해결 시간. 해결 시간이 하나도 없으면 0.0.
    pub fn year_average_minutes(&self) -> f64 {
        if self.durations.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.durations.iter().sum();
        round2(sum / self.durations.len() as f64)
    }

    /// 해결 시간이 있는 달의 월별 평균
    pub fn monthly_average_minutes(&self) -> BTreeMap<MonthBucket, f64> {
        self.duration_by_month
            .iter()
            .filter_map(|(month, stats)| stats.average().map(|avg| (*month, avg)))
            .collect()
    }

    /// 상위 태그 (최대 10개)
    pub fn top_tags(&self, limit: usize) -> Vec<(&str, u64)> {
        self.tag_counts.top(limit)
    }
}

/// 집계 진행 상태. 티켓을 하나씩 받아 누적한다.
#[derive(Debug)]
pub struct AggregationContext<'a> {
    settings: &'a AggregationSettings,
    state: ReportAggregate,
}

impl<'a> AggregationContext<'a> {
    pub fn new(settings: &'a AggregationSettings) -> Self {
        Self {
            settings,
            state: ReportAggregate::default(),
        }
    }

    /// 티켓 하나 반영. 관련 티켓이면 `true`.
    pub fn ingest(&mut self, ticket: &Ticket) -> bool {
        self.state.tickets_seen += 1;

        if !ticket.is_closed() {
            return false;
        }
        let anchor = self.settings.anchor;
        let Some(anchor_at) = ticket.anchor_time(anchor) else {
            return false;
        };
        if !self.settings.window.contains(&anchor_at) {
            return false;
        }

        let state = &mut self.state;
        state.total_resolved += 1;

        let resolved_month = MonthBucket::from_datetime(&anchor_at);
        *state.resolved_by_month.entry(resolved_month).or_insert(0) += 1;

        if let Some(created) = ticket.created_time() {
            *state
                .created_by_month
                .entry(MonthBucket::from_datetime(&created))
                .or_insert(0) += 1;
        }

        let minutes = match (ticket.created_at.as_deref(), ticket.anchor_raw(anchor)) {
            (Some(created), Some(anchored)) => resolution_minutes(created, anchored),
            _ => None,
        };
        if let Some(minutes) = minutes {
            state.durations.push(minutes);
            state
                .duration_by_month
                .entry(resolved_month)
                .or_default()
                .record(minutes);
        }

        for name in ticket.tag_names() {
            if !self.settings.excluded_tags.contains(name) {
                state.tag_counts.increment(name);
            }
        }
        true
    }

    pub fn finish(self) -> ReportAggregate {
        self.state
    }
}

/// 티켓 목록을 한 번에 집계
pub fn aggregate<'t, I>(tickets: I, settings: &AggregationSettings) -> ReportAggregate
where
    I: IntoIterator<Item = &'t Ticket>,
{
    tickets
        .into_iter()
        .fold(AggregationContext::new(settings), |mut ctx, ticket| {
            ctx.ingest(ticket);
            ctx
        })
        .finish()
}
