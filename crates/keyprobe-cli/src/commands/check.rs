//! 단일 자격증명 진단.

use std::path::PathBuf;

use anyhow::{Context, Result};
use keyprobe_core::{AppConfig, Environment, FleetReport};
use keyprobe_exchange::FleetAggregator;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{build_runner, credential_from_args, OutputMode};

/// 단일 진단 설정.
#[derive(Debug)]
pub struct CheckConfig {
    /// 표시 이름
    pub name: String,
    /// API 키 (없으면 `DELTA_API_KEY`)
    pub api_key: Option<String>,
    /// API 시크릿 (없으면 `DELTA_API_SECRET`)
    pub api_secret: Option<String>,
    /// 진단 대상 환경 (없으면 설정값)
    pub environment: Option<Environment>,
    /// 환경 판별 단계 생략
    pub skip_environment_check: bool,
    /// JSON 출력
    pub json: bool,
    /// JSON 출력 파일 (지정 시 JSON 출력)
    pub output: Option<PathBuf>,
}

/// 자격증명 하나를 진단합니다.
pub async fn run_check(
    app: &AppConfig,
    config: CheckConfig,
    cancel: &CancellationToken,
) -> Result<FleetReport> {
    let credential = credential_from_args(&config.name, config.api_key, config.api_secret);
    let runner = build_runner(app, config.environment, config.skip_environment_check)?;
    let mode = OutputMode::from_flags(config.json, config.output);

    if mode.is_console() {
        println!("\n🔐 API 자격증명 진단");
        println!("환경: {}", runner.declared_environment());
        println!("API Key: {}", credential.masked_key());
    }

    let sink = mode.into_sink(false)?;

    let report = FleetAggregator::new(runner)
        .run_with_sink(vec![credential], sink.as_ref(), cancel)
        .await
        .context("Failed to write report")?;

    info!(working = report.working_count(), "Check finished");
    Ok(report)
}
