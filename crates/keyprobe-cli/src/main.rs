//! API 자격증명 진단 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 환경변수(DELTA_API_KEY, DELTA_API_SECRET)의 자격증명 진단
//! keyprobe check
//!
//! # DB에 등록된 모든 브로커/팔로워 계정 진단
//! keyprobe fleet --source db
//!
//! # TOML 파일의 자격증명을 4개씩 동시에 진단하고 JSON으로 저장
//! keyprobe fleet --source file --file credentials.toml --concurrency 4 --json -o report.json
//!
//! # 키가 어느 환경용인지 확인
//! keyprobe resolve --api-key ... --api-secret ...
//!
//! # 서명 계산
//! keyprobe sign --secret test_secret --path /v2/wallet/balances --timestamp 1234567890
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use keyprobe_core::{
    init_logging, AppConfig, Environment, EnvironmentVerdict, FleetHealth, FleetReport, LogConfig,
    DEFAULT_CONFIG_PATH,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use keyprobe_cli::commands::check::{run_check, CheckConfig};
use keyprobe_cli::commands::fleet::{run_fleet, FleetConfig, SourceKind};
use keyprobe_cli::commands::resolve::{run_resolve, ResolveConfig};
use keyprobe_cli::commands::sign::{run_sign, SignConfig};

/// Ctrl+C 중단 시 종료 코드.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "keyprobe")]
#[command(about = "API credential diagnostics - 거래소 API 키 인증 문제 진단 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 자격증명 하나를 단계별로 진단
    Check {
        /// 표시 이름
        #[arg(short, long, default_value = "cli")]
        name: String,

        /// API 키 (기본: DELTA_API_KEY 환경변수)
        #[arg(long)]
        api_key: Option<String>,

        /// API 시크릿 (기본: DELTA_API_SECRET 환경변수)
        #[arg(long)]
        api_secret: Option<String>,

        /// 진단 대상 환경 (production, testnet)
        #[arg(short, long)]
        environment: Option<String>,

        /// 환경 판별 단계 생략
        #[arg(long, default_value = "false")]
        skip_env_check: bool,

        /// JSON 출력
        #[arg(long, default_value = "false")]
        json: bool,

        /// JSON 출력 파일 경로 (지정 시 --json 없이도 JSON 출력)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 등록된 모든 자격증명 진단
    Fleet {
        /// 자격증명 제공자 (db, file, env)
        #[arg(short, long, default_value = "db")]
        source: String,

        /// 자격증명 TOML 파일 (--source file)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// 데이터베이스 URL (기본: DATABASE_URL 환경변수)
        #[arg(long)]
        db_url: Option<String>,

        /// 브로커 계정만 진단
        #[arg(long, default_value = "false")]
        brokers_only: bool,

        /// 동시 진단 수 (기본: 설정값)
        #[arg(long)]
        concurrency: Option<usize>,

        /// 진단 대상 환경 (production, testnet)
        #[arg(short, long)]
        environment: Option<String>,

        /// 환경 판별 단계 생략
        #[arg(long, default_value = "false")]
        skip_env_check: bool,

        /// JSON 출력
        #[arg(long, default_value = "false")]
        json: bool,

        /// JSON 출력 파일 경로 (지정 시 --json 없이도 JSON 출력)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 진행률 표시줄 숨김
        #[arg(long, default_value = "false")]
        no_progress: bool,
    },

    /// 자격증명이 어느 환경용인지 판별
    Resolve {
        /// API 키 (기본: DELTA_API_KEY 환경변수)
        #[arg(long)]
        api_key: Option<String>,

        /// API 시크릿 (기본: DELTA_API_SECRET 환경변수)
        #[arg(long)]
        api_secret: Option<String>,

        /// JSON 출력
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// HMAC-SHA256 서명 계산
    Sign {
        /// API 시크릿
        #[arg(long)]
        secret: String,

        /// 서명할 메시지 (지정 시 요청 필드 무시)
        #[arg(short, long)]
        message: Option<String>,

        /// HTTP 메서드
        #[arg(long, default_value = "GET")]
        method: String,

        /// 요청 경로 (예: /v2/wallet/balances)
        #[arg(short, long)]
        path: Option<String>,

        /// 쿼리 문자열 (예: ?state=open)
        #[arg(short, long, default_value = "")]
        query: String,

        /// 요청 본문
        #[arg(short, long, default_value = "")]
        body: String,

        /// Unix 타임스탬프 (초, 기본: 현재 시각)
        #[arg(short, long)]
        timestamp: Option<i64>,
    },
}

fn parse_environment(value: Option<String>) -> Result<Option<Environment>> {
    value
        .map(|v| {
            v.parse::<Environment>()
                .map_err(|e| anyhow!(e))
        })
        .transpose()
}

/// 플릿 결과를 종료 코드로 변환.
fn fleet_exit_code(report: &FleetReport) -> ExitCode {
    if report.interrupted() {
        return ExitCode::from(EXIT_INTERRUPTED);
    }
    match report.health() {
        FleetHealth::AllWorking | FleetHealth::Empty => ExitCode::SUCCESS,
        FleetHealth::Partial | FleetHealth::NoneWorking => ExitCode::FAILURE,
    }
}

/// Ctrl+C 수신 시 진단 중단.
async fn shutdown_signal(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received Ctrl+C, stopping after in-flight credentials...");
            eprintln!("\n⚠️  중단 요청됨: 진행 중인 진단이 끝나면 중지합니다.");
            cancel.cancel();
        }
        Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    match cli.command {
        Commands::Check {
            name,
            api_key,
            api_secret,
            environment,
            skip_env_check,
            json,
            output,
        } => {
            let check = CheckConfig {
                name,
                api_key,
                api_secret,
                environment: parse_environment(environment)?,
                skip_environment_check: skip_env_check,
                json,
                output,
            };

            let report = run_check(&config, check, &cancel).await.map_err(|e| {
                error!("Check failed: {:#}", e);
                e
            })?;
            Ok(fleet_exit_code(&report))
        }

        Commands::Fleet {
            source,
            file,
            db_url,
            brokers_only,
            concurrency,
            environment,
            skip_env_check,
            json,
            output,
            no_progress,
        } => {
            let fleet = FleetConfig {
                source: SourceKind::parse(&source)?,
                file,
                db_url,
                brokers_only,
                concurrency,
                environment: parse_environment(environment)?,
                skip_environment_check: skip_env_check,
                json,
                output,
                no_progress,
            };

            let report = run_fleet(&config, fleet, &cancel).await.map_err(|e| {
                error!("Fleet diagnosis failed: {:#}", e);
                e
            })?;
            info!("✅ Diagnosed {} credentials", report.total_count());
            Ok(fleet_exit_code(&report))
        }

        Commands::Resolve {
            api_key,
            api_secret,
            json,
        } => {
            let resolution = run_resolve(
                &config,
                ResolveConfig {
                    api_key,
                    api_secret,
                    json,
                },
            )
            .await?;

            match resolution.verdict() {
                EnvironmentVerdict::NoMatch => Ok(ExitCode::FAILURE),
                _ => Ok(ExitCode::SUCCESS),
            }
        }

        Commands::Sign {
            secret,
            message,
            method,
            path,
            query,
            body,
            timestamp,
        } => {
            run_sign(SignConfig {
                secret,
                message,
                method,
                path,
                query,
                body,
                timestamp,
            })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
