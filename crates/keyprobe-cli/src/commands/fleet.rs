//! 등록된 모든 자격증명 진단.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use keyprobe_core::{AppConfig, CredentialSource, Environment, FleetReport};
use keyprobe_exchange::FleetAggregator;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{build_runner, OutputMode};
use crate::source::{EnvCredentialSource, FileCredentialSource, PostgresCredentialSource};

/// 자격증명 제공자 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// PostgreSQL 계정 테이블
    Database,
    /// TOML 파일
    File,
    /// 환경변수
    Env,
}

impl SourceKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "db" | "database" | "postgres" => Ok(Self::Database),
            "file" | "toml" => Ok(Self::File),
            "env" => Ok(Self::Env),
            _ => Err(anyhow!("Invalid source: {}. Use: db, file, env", s)),
        }
    }
}

/// 플릿 진단 설정.
#[derive(Debug)]
pub struct FleetConfig {
    /// 자격증명 제공자
    pub source: SourceKind,
    /// 자격증명 파일 경로 (`SourceKind::File`)
    pub file: Option<PathBuf>,
    /// 데이터베이스 URL (없으면 설정값 또는 `DATABASE_URL`)
    pub db_url: Option<String>,
    /// 브로커 계정만 진단
    pub brokers_only: bool,
    /// 동시 진단 수 (없으면 설정값)
    pub concurrency: Option<usize>,
    /// 진단 대상 환경 (없으면 설정값)
    pub environment: Option<Environment>,
    /// 환경 판별 단계 생략
    pub skip_environment_check: bool,
    /// JSON 출력
    pub json: bool,
    /// JSON 출력 파일 (지정 시 JSON 출력)
    pub output: Option<PathBuf>,
    /// 진행률 표시줄 숨김
    pub no_progress: bool,
}

fn build_source(app: &AppConfig, config: &FleetConfig) -> Result<Box<dyn CredentialSource>> {
    match config.source {
        SourceKind::Database => {
            let mut database = app.database.clone();
            if let Some(url) = &config.db_url {
                database.url = Some(url.clone());
            }
            if config.brokers_only {
                database.include_followers = false;
            }
            Ok(Box::new(PostgresCredentialSource::from_config(&database)?))
        }
        SourceKind::File => {
            let path = config
                .file
                .as_ref()
                .ok_or_else(|| anyhow!("--file is required for the file source"))?;
            Ok(Box::new(FileCredentialSource::new(path)))
        }
        SourceKind::Env => Ok(Box::new(EnvCredentialSource)),
    }
}

/// 제공자의 모든 활성 자격증명을 진단합니다.
pub async fn run_fleet(
    app: &AppConfig,
    config: FleetConfig,
    cancel: &CancellationToken,
) -> Result<FleetReport> {
    let source = build_source(app, &config)?;
    let runner = build_runner(app, config.environment, config.skip_environment_check)?;
    let concurrency = config.concurrency.unwrap_or(app.fleet.concurrency);
    let mode = OutputMode::from_flags(config.json, config.output);

    if mode.is_console() {
        println!("\n🔐 API 자격증명 플릿 진단");
        println!("제공자: {}", source.name());
        println!("환경: {}", runner.declared_environment());
        println!("동시 진단 수: {}", concurrency.max(1));
    }

    let sink = mode.into_sink(!config.no_progress)?;

    let report = FleetAggregator::new(runner)
        .with_concurrency(concurrency)
        .run_from_source(source.as_ref(), sink.as_ref(), cancel)
        .await
        .context("Fleet diagnosis failed")?;

    info!(
        working = report.working_count(),
        total = report.total_count(),
        "Fleet command finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source: SourceKind) -> FleetConfig {
        FleetConfig {
            source,
            file: None,
            db_url: None,
            brokers_only: false,
            concurrency: None,
            environment: None,
            skip_environment_check: false,
            json: true,
            output: None,
            no_progress: true,
        }
    }

    #[test]
    fn test_parse_source_kind() {
        assert_eq!(SourceKind::parse("DB").unwrap(), SourceKind::Database);
        assert_eq!(SourceKind::parse("toml").unwrap(), SourceKind::File);
        assert_eq!(SourceKind::parse("env").unwrap(), SourceKind::Env);
        assert!(SourceKind::parse("redis").is_err());
    }

    #[test]
    fn test_file_source_requires_path() {
        let app = AppConfig::default();
        assert!(build_source(&app, &config(SourceKind::File)).is_err());

        let mut with_file = config(SourceKind::File);
        with_file.file = Some(PathBuf::from("credentials.toml"));
        assert_eq!(build_source(&app, &with_file).unwrap().name(), "file");
    }

    #[test]
    fn test_db_url_flag_overrides_config() {
        let app = AppConfig::default();
        let mut db = config(SourceKind::Database);
        db.db_url = Some("postgres://localhost/keyprobe".to_string());
        assert_eq!(build_source(&app, &db).unwrap().name(), "postgres");
    }
}
