//! `ticketpulse` 바이너리.
//!
//! 티켓 API → 집계 → 대시보드 푸시 1회 실행 후 종료. 에러 시 0이 아닌 코드로 종료한다.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ticketpulse_app::settings::load_config;
use ticketpulse_app::wiring::build_adapters;
use ticketpulse_core::config::Credentials;
use ticketpulse_report::job::{run_counts, JobSettings, ReportJob};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 헬프데스크 티켓 지표를 대시보드로 푸시
#[derive(Parser, Debug)]
#[command(name = "ticketpulse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (toml/json/yaml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 대상 연도 (기본: 설정값, 없으면 현재 UTC 연도)
    #[arg(long, short = 'y')]
    year: Option<i32>,

    /// 푸시하지 않고 페이로드를 출력
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// 연간 리포트 (기본)
    Report,
    /// 상태별 티켓 건수만 푸시
    Counts,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "ticketpulse={lvl},ticketpulse_app={lvl},ticketpulse_core={lvl},ticketpulse_network={lvl},ticketpulse_report={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config = load_config(args.config.as_deref())?;
    let creds = Credentials::from_env().context("자격증명 로드 실패")?;
    let adapters = build_adapters(&config, &creds).context("어댑터 생성 실패")?;

    let now = Utc::now();
    let year = args.year.or(config.report.year).unwrap_or_else(|| now.year());

    match args.command.unwrap_or(Command::Report) {
        Command::Report => {
            let settings = JobSettings::from_config(&config, year, args.dry_run);
            let job = ReportJob::new(adapters.tickets, adapters.csat, adapters.sink, settings);
            let report = job.run(now).await.context("리포트 작업 실패")?;

            match report.receipt {
                Some(receipt) => println!("Pushed {} items", receipt.items),
                None => println!("{}", serde_json::to_string_pretty(&report.records)?),
            }
        }
        Command::Counts => {
            let report = run_counts(
                adapters.tickets.as_ref(),
                adapters.sink.as_ref(),
                &config.report.key_prefix,
                year,
                now,
                args.dry_run,
            )
            .await
            .context("건수 작업 실패")?;

            match report.receipt {
                Some(receipt) => println!("Pushed {} items", receipt.items),
                None => println!("{}", serde_json::to_string_pretty(&report.counters)?),
            }
        }
    }

    info!("완료");
    Ok(())
}
