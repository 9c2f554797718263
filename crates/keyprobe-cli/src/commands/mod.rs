//! CLI 명령어 구현 모듈.

pub mod check;
pub mod fleet;
pub mod resolve;
pub mod sign;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use keyprobe_core::{AppConfig, Credential, Environment, ReportSink, Stage};
use keyprobe_exchange::{DiagnosticRunner, ProbeClient, ProbeClientConfig};

use crate::sink::{ConsoleReportSink, JsonReportSink};
use crate::source::{API_KEY_ENV, API_SECRET_ENV};

/// 결과 출력 방식.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// 콘솔 표
    Console,
    /// JSON (stdout)
    JsonStdout,
    /// JSON (파일)
    JsonFile(PathBuf),
}

impl OutputMode {
    /// 명령행 플래그에서 결정. 출력 파일을 지정하면 JSON으로 출력합니다.
    pub fn from_flags(json: bool, output: Option<PathBuf>) -> Self {
        match output {
            Some(path) => Self::JsonFile(path),
            None if json => Self::JsonStdout,
            None => Self::Console,
        }
    }

    /// 콘솔 출력 여부.
    pub fn is_console(&self) -> bool {
        matches!(self, Self::Console)
    }

    /// 출력 대상 생성.
    pub fn into_sink(self, show_progress: bool) -> Result<Box<dyn ReportSink>> {
        Ok(match self {
            Self::Console => Box::new(ConsoleReportSink::new(show_progress)?),
            Self::JsonStdout => Box::new(JsonReportSink::stdout()),
            Self::JsonFile(path) => Box::new(JsonReportSink::to_file(path)),
        })
    }
}

/// 설정에서 프로브 클라이언트 생성.
pub fn build_client(config: &AppConfig) -> Result<Arc<ProbeClient>> {
    let client = ProbeClient::new(ProbeClientConfig::from_settings(&config.exchange))
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(client))
}

/// 설정과 명령 옵션에서 진단 실행기 생성.
///
/// `environment`가 없으면 설정의 진단 대상 환경을 사용합니다.
pub fn build_runner(
    config: &AppConfig,
    environment: Option<Environment>,
    skip_environment_check: bool,
) -> Result<DiagnosticRunner> {
    let declared = environment.unwrap_or(config.exchange.declared_environment);
    let runner = DiagnosticRunner::new(build_client(config)?, declared);

    if config.exchange.environment_check && !skip_environment_check {
        Ok(runner.with_extra_stages(&[Stage::EnvironmentCheck]))
    } else {
        Ok(runner)
    }
}

/// 명령행 값, 없으면 환경변수에서 단일 자격증명을 구성합니다.
pub fn credential_from_args(
    name: &str,
    api_key: Option<String>,
    api_secret: Option<String>,
) -> Credential {
    let api_key = api_key
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .unwrap_or_default();
    let api_secret = api_secret
        .or_else(|| std::env::var(API_SECRET_ENV).ok())
        .unwrap_or_default();
    Credential::new(name, api_key, api_secret)
}
