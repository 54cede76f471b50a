//! 설정 + 자격증명 → 어댑터 생성.

use std::sync::Arc;
use ticketpulse_core::config::{AppConfig, Credentials};
use ticketpulse_core::error::CoreError;
use ticketpulse_core::ports::csat_source::CsatSource;
use ticketpulse_network::csat_client::HttpCsatSource;
use ticketpulse_network::push_client::DataboxClient;
use ticketpulse_network::retry::RetryPolicy;
use ticketpulse_network::ticket_client::EnchantClient;
use ticketpulse_report::csat_file::CsvCsatSource;
use tracing::info;

/// 작업에 주입할 어댑터 묶음
pub struct Adapters {
    pub tickets: Arc<EnchantClient>,
    pub csat: Option<Arc<dyn CsatSource>>,
    pub sink: Arc<DataboxClient>,
}

/// 어댑터 생성
///
/// CSAT 소스는 CSV 경로 → 만족도 API(활성화 시) → 없음 순으로 하나만 선택한다.
pub fn build_adapters(config: &AppConfig, creds: &Credentials) -> Result<Adapters, CoreError> {
    let policy = RetryPolicy::from_config(&config.retry);
    let base_url = config.source.resolve_base_url(&creds.site);
    info!("티켓 API: {base_url}");

    let tickets = Arc::new(EnchantClient::new(
        &base_url,
        &creds.source_token,
        &config.source.user_agent,
        config.source_timeout(),
        policy.clone(),
    )?);

    let csat: Option<Arc<dyn CsatSource>> = if let Some(path) = &creds.csat_csv {
        info!("CSAT 소스: CSV {}", path.display());
        Some(Arc::new(CsvCsatSource::new(path.clone())))
    } else if config.csat.api_enabled {
        info!("CSAT 소스: 만족도 API {}", config.csat.api_path);
        Some(Arc::new(HttpCsatSource::new(
            &base_url,
            &config.csat.api_path,
            &creds.source_token,
            config.source_timeout(),
            policy.clone(),
        )?))
    } else {
        None
    };

    let sink = Arc::new(DataboxClient::new(
        &config.push.url,
        &creds.push_token,
        config.push_timeout(),
        policy,
    )?);

    Ok(Adapters {
        tickets,
        csat,
        sink,
    })
}
