//! 설정 로드.
//!
//! 기본값 → 설정 파일(선택) → `TICKETPULSE_*` 환경변수 순으로 덮어쓴다.
//! 예: `TICKETPULSE_REPORT__ZERO_FILL_MONTHS=true`,
//! `TICKETPULSE_REPORT__EXCLUDED_TAGS=SU,Core Support`

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::path::Path;
use ticketpulse_core::config::AppConfig;
use tracing::debug;

/// 환경변수 접두사
pub const ENV_PREFIX: &str = "TICKETPULSE";

/// 프로세스 환경변수로 설정 로드
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    load_config_with_env(path, None)
}

/// 환경변수 맵을 직접 지정해 설정 로드 (`None`이면 프로세스 환경)
pub fn load_config_with_env(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<AppConfig> {
    let defaults =
        Config::try_from(&AppConfig::default_config()).context("기본 설정 직렬화 실패")?;
    let mut builder = Config::builder().add_source(defaults);

    if let Some(path) = path {
        debug!("설정 파일: {}", path.display());
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("report.excluded_tags")
            .source(env),
    );

    let config: AppConfig = builder
        .build()
        .context("설정 로드 실패")?
        .try_deserialize()
        .context("설정 형식 오류")?;
    config.validate().context("설정 검증 실패")?;
    Ok(config)
}
