//! 설정 관리.
//!
//! 기본값 → TOML 파일 → `KEYPROBE__` 접두사 환경 변수 순으로 덮어씁니다.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Environment, EnvironmentEndpoints, DEFAULT_PRODUCTION_URL, DEFAULT_TESTNET_URL};

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 거래소 연결 설정
    #[serde(default)]
    pub exchange: ExchangeSettings,
    /// 플릿 실행 설정
    #[serde(default)]
    pub fleet: FleetSettings,
    /// 자격증명 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// 거래소 연결 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeSettings {
    /// 운영 환경 REST URL
    #[serde(default = "default_production_url")]
    pub production_url: String,
    /// 테스트넷 REST URL
    #[serde(default = "default_testnet_url")]
    pub testnet_url: String,
    /// 운영자가 선택한 진단 대상 환경
    #[serde(default)]
    pub declared_environment: Environment,
    /// 요청 User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 진단 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// 환경 판별 요청 타임아웃 (초)
    #[serde(default = "default_environment_probe_timeout")]
    pub environment_probe_timeout_secs: u64,
    /// 공인 IP 조회 서비스 URL
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
    /// 공인 IP 조회 타임아웃 (초)
    #[serde(default = "default_ip_lookup_timeout")]
    pub ip_lookup_timeout_secs: u64,
    /// 환경 판별 단계 실행 여부
    #[serde(default = "default_true")]
    pub environment_check: bool,
}

fn default_production_url() -> String {
    DEFAULT_PRODUCTION_URL.to_string()
}
fn default_testnet_url() -> String {
    DEFAULT_TESTNET_URL.to_string()
}
fn default_user_agent() -> String {
    format!("keyprobe/{}", env!("CARGO_PKG_VERSION"))
}
fn default_request_timeout() -> u64 {
    10
}
fn default_environment_probe_timeout() -> u64 {
    5
}
fn default_ip_lookup_url() -> String {
    "https://api.ipify.org".to_string()
}
fn default_ip_lookup_timeout() -> u64 {
    5
}
fn default_true() -> bool {
    true
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            production_url: default_production_url(),
            testnet_url: default_testnet_url(),
            declared_environment: Environment::Production,
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            environment_probe_timeout_secs: default_environment_probe_timeout(),
            ip_lookup_url: default_ip_lookup_url(),
            ip_lookup_timeout_secs: default_ip_lookup_timeout(),
            environment_check: true,
        }
    }
}

impl ExchangeSettings {
    /// 환경별 URL 바인딩.
    pub fn endpoints(&self) -> EnvironmentEndpoints {
        EnvironmentEndpoints::new(self.production_url.clone(), self.testnet_url.clone())
    }

    /// 진단 요청 타임아웃.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 환경 판별 요청 타임아웃.
    pub fn environment_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.environment_probe_timeout_secs)
    }

    /// 공인 IP 조회 타임아웃.
    pub fn ip_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.ip_lookup_timeout_secs)
    }
}

/// 플릿 실행 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FleetSettings {
    /// 동시에 진단할 자격증명 수 (1 = 순차)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// 자격증명 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// 연결 URL (없으면 `DATABASE_URL` 환경 변수 사용)
    #[serde(default)]
    pub url: Option<String>,
    /// 팔로워 계정 포함 여부
    #[serde(default = "default_true")]
    pub include_followers: bool,
    /// 최대 연결 수
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            include_followers: true,
            max_connections: default_max_connections(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("KEYPROBE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let mut app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// 값 범위를 검증하고 보정합니다.
    fn validate(&mut self) -> Result<(), config::ConfigError> {
        if self.fleet.concurrency == 0 {
            self.fleet.concurrency = 1;
        }
        if self.exchange.request_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "exchange.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.exchange.ip_lookup_timeout_secs == 0
            || self.exchange.environment_probe_timeout_secs == 0
        {
            return Err(config::ConfigError::Message(
                "exchange timeouts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.exchange.request_timeout_secs, 10);
        assert_eq!(config.exchange.ip_lookup_timeout_secs, 5);
        assert_eq!(config.exchange.declared_environment, Environment::Production);
        assert!(config.exchange.environment_check);
        assert_eq!(config.fleet.concurrency, 1);
        assert!(config.exchange.user_agent.starts_with("keyprobe/"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("keyprobe-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[exchange]
declared_environment = "testnet"
request_timeout_secs = 3

[fleet]
concurrency = 0
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.exchange.declared_environment, Environment::Testnet);
        assert_eq!(config.exchange.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.exchange.production_url, DEFAULT_PRODUCTION_URL);
        assert_eq!(config.fleet.concurrency, 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = std::env::temp_dir().join(format!("keyprobe-config-zero-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("zero.toml");
        std::fs::write(&path, "[exchange]\nrequest_timeout_secs = 0\n").unwrap();

        assert!(AppConfig::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
