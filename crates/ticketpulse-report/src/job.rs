//! 작업 오케스트레이션.
//!
//! 페이지 순회 → 집계 → CSAT 로드 → 페이로드 생성 → 푸시 1회.
//! 모든 단계는 순차 실행되며 `now`를 주입받아 윈도우를 결정한다.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use ticketpulse_core::config::AppConfig;
use ticketpulse_core::error::CoreError;
use ticketpulse_core::models::csat::CsatSummary;
use ticketpulse_core::models::metric::{MetricRecord, PushReceipt};
use ticketpulse_core::models::month::ReportWindow;
use ticketpulse_core::models::ticket::{ResolutionAnchor, TicketState};
use ticketpulse_core::ports::csat_source::CsatSource;
use ticketpulse_core::ports::metric_sink::MetricSink;
use ticketpulse_core::ports::ticket_source::{TicketCounter, TicketQuery, TicketSource};
use tracing::{debug, info, warn};

use crate::aggregator::{AggregationContext, AggregationSettings};
use crate::pager::{drain_tickets, PageStats};
use crate::payload::{PayloadBuilder, PayloadSettings};

/// 디버그 로그에 미리 보여줄 레코드 수
const PREVIEW_RECORDS: usize = 6;

/// 작업 설정
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub year: i32,
    pub per_page: u32,
    pub anchor: ResolutionAnchor,
    pub excluded_tags: Vec<String>,
    pub payload: PayloadSettings,
    /// 푸시 대신 결과만 반환
    pub dry_run: bool,
}

impl JobSettings {
    /// 로드된 설정에서 작업 설정 구성
    pub fn from_config(config: &AppConfig, year: i32, dry_run: bool) -> Self {
        let report = &config.report;
        Self {
            year,
            per_page: config.source.per_page,
            anchor: report.anchor,
            excluded_tags: report.excluded_tags.clone(),
            payload: PayloadSettings {
                key_prefix: report.key_prefix.clone(),
                year,
                top_tags: report.top_tags,
                zero_fill_months: report.zero_fill_months,
                include_created_series: report.include_created_series,
            },
            dry_run,
        }
    }

    fn window(&self, now: DateTime<Utc>) -> Result<ReportWindow, CoreError> {
        window_for(self.year, now)
    }
}

fn window_for(year: i32, now: DateTime<Utc>) -> Result<ReportWindow, CoreError> {
    ReportWindow::for_year(year, now).ok_or_else(|| CoreError::Validation {
        field: "report.year".to_string(),
        message: format!("지원하지 않는 연도: {year}"),
    })
}

/// 작업 결과
#[derive(Debug, Clone)]
pub struct JobReport {
    pub window: ReportWindow,
    pub pages: PageStats,
    pub total_resolved: u64,
    /// CSAT를 제공한 소스 이름
    pub csat_source: Option<&'static str>,
    pub records: Vec<MetricRecord>,
    /// 드라이런이면 `None`
    pub receipt: Option<PushReceipt>,
}

/// 리포트 작업
pub struct ReportJob {
    tickets: Arc<dyn TicketSource>,
    csat: Option<Arc<dyn CsatSource>>,
    sink: Arc<dyn MetricSink>,
    settings: JobSettings,
}

impl ReportJob {
    pub fn new(
        tickets: Arc<dyn TicketSource>,
        csat: Option<Arc<dyn CsatSource>>,
        sink: Arc<dyn MetricSink>,
        settings: JobSettings,
    ) -> Self {
        Self {
            tickets,
            csat,
            sink,
            settings,
        }
    }

    /// 작업 실행
    pub async fn run(&self, now: DateTime<Utc>) -> Result<JobReport, CoreError> {
        let window = self.settings.window(now)?;
        info!(
            "리포트 시작: {}년 ({} ~ {}), 기준 {}",
            self.settings.year,
            window.start,
            window.end,
            self.settings.anchor.field_name()
        );

        // 1. 페이지 순회 + 집계
        let agg_settings = AggregationSettings::new(
            window,
            self.settings.anchor,
            self.settings.excluded_tags.iter().cloned(),
        );
        let query = TicketQuery::closed_since(window.start, self.settings.per_page);
        let mut ctx = AggregationContext::new(&agg_settings);
        let pages = drain_tickets(self.tickets.as_ref(), &query, |ticket| {
            ctx.ingest(&ticket);
        })
        .await?;
        let aggregate = ctx.finish();
        info!(
            "관련 티켓 {}개 / 수신 {}개, 태그 {}종",
            aggregate.total_resolved,
            aggregate.tickets_seen,
            aggregate.tag_counts.len()
        );

        // 2. CSAT (실패는 CSAT 생략)
        let (csat, csat_source) = self.load_csat(&window).await;

        // 3. 페이로드
        let records =
            PayloadBuilder::new(&self.settings.payload).build(&aggregate, csat.as_ref(), &window);
        log_preview(&records);

        // 4. 푸시
        let receipt = if self.settings.dry_run {
            info!("드라이런, 푸시 생략");
            None
        } else {
            Some(self.sink.push_records(&records).await?)
        };

        Ok(JobReport {
            window,
            pages,
            total_resolved: aggregate.total_resolved,
            csat_source,
            records,
            receipt,
        })
    }

    async fn load_csat(&self, window: &ReportWindow) -> (Option<CsatSummary>, Option<&'static str>) {
        let Some(source) = &self.csat else {
            debug!("CSAT 소스 미설정");
            return (None, None);
        };

        match source.load(window).await {
            Ok(Some(summary)) => {
                info!(
                    "CSAT ({}) 연간 평균 {:.2}, {}개월",
                    source.name(),
                    summary.yearly_average,
                    summary.monthly.len()
                );
                (Some(summary), Some(source.name()))
            }
            Ok(None) => {
                info!("CSAT ({}) 데이터 없음, 생략", source.name());
                (None, None)
            }
            Err(e) => {
                warn!("CSAT ({}) 로드 실패, 생략: {e}", source.name());
                (None, None)
            }
        }
    }
}

fn log_preview(records: &[MetricRecord]) {
    info!("지표 레코드 {}개 생성", records.len());
    for record in records.iter().take(PREVIEW_RECORDS) {
        match &record.date {
            Some(date) => debug!("  {} = {} @ {date}", record.key, record.value.as_f64()),
            None => debug!("  {} = {}", record.key, record.value.as_f64()),
        }
    }
}

/// 건수 작업 결과
#[derive(Debug, Clone)]
pub struct CountReport {
    pub counters: BTreeMap<String, u64>,
    /// 드라이런이면 `None`
    pub receipt: Option<PushReceipt>,
}

/// 상태별 티켓 건수를 하나의 객체로 푸시
///
/// `open`/`hold`는 전체 건수, `closed`는 윈도우 시작 이후 건수.
pub async fn run_counts(
    counter: &dyn TicketCounter,
    sink: &dyn MetricSink,
    key_prefix: &str,
    year: i32,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<CountReport, CoreError> {
    let window = window_for(year, now)?;
    let mut counters = BTreeMap::new();

    for state in TicketState::all() {
        let since = (state == TicketState::Closed).then_some(window.start);
        let count = counter.count_tickets(state, since).await?;
        info!("{state} 티켓: {count}");
        counters.insert(format!("{key_prefix}_tickets_{state}"), count);
    }

    let receipt = if dry_run {
        info!("드라이런, 푸시 생략");
        None
    } else {
        Some(sink.push_counters(&counters).await?)
    };

    Ok(CountReport { counters, receipt })
}
