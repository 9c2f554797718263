//! 자격증명 제공자 구현.
//!
//! - [`PostgresCredentialSource`]: `broker_accounts` / `followers` 테이블
//! - [`FileCredentialSource`]: `[[credentials]]` 항목을 가진 TOML 파일
//! - [`EnvCredentialSource`]: `DELTA_API_KEY` / `DELTA_API_SECRET` 환경변수

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use keyprobe_core::{
    Credential, CredentialKind, CredentialSource, DatabaseConfig, DiagnosticError,
    DiagnosticResult,
};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

/// API 키 환경변수 이름.
pub const API_KEY_ENV: &str = "DELTA_API_KEY";
/// API 시크릿 환경변수 이름.
pub const API_SECRET_ENV: &str = "DELTA_API_SECRET";

const BROKER_QUERY: &str = r#"
    SELECT COALESCE(account_name, id::text) AS name, api_key, api_secret
    FROM broker_accounts
    WHERE is_active = true AND is_verified = true
    ORDER BY created_at
"#;

const FOLLOWER_QUERY: &str = r#"
    SELECT COALESCE(follower_name, id::text) AS name, api_key, api_secret
    FROM followers
    WHERE account_status = 'active'
    ORDER BY created_at
"#;

/// 계정 테이블 행. 키/시크릿은 비어 있을 수 있습니다.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    name: String,
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl AccountRow {
    fn into_credential(self, kind: CredentialKind) -> Credential {
        Credential::new(
            self.name,
            self.api_key.unwrap_or_default(),
            self.api_secret.unwrap_or_default(),
        )
        .with_kind(kind)
    }
}

/// PostgreSQL 계정 테이블 기반 제공자.
///
/// 활성/검증된 브로커 계정을 먼저, 활성 팔로워 계정을 그 다음에 반환합니다.
#[derive(Debug, Clone)]
pub struct PostgresCredentialSource {
    database_url: String,
    include_followers: bool,
    max_connections: u32,
}

impl PostgresCredentialSource {
    /// 설정에서 생성. URL이 없으면 `DATABASE_URL` 환경변수를 사용합니다.
    pub fn from_config(config: &DatabaseConfig) -> DiagnosticResult<Self> {
        let database_url = config
            .url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .ok_or_else(|| {
                DiagnosticError::Config(
                    "DATABASE_URL not found. Set DATABASE_URL or database.url".to_string(),
                )
            })?;

        Ok(Self {
            database_url,
            include_followers: config.include_followers,
            max_connections: config.max_connections,
        })
    }
}

#[async_trait]
impl CredentialSource for PostgresCredentialSource {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn list_active_credentials(&self) -> DiagnosticResult<Vec<Credential>> {
        info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
            .map_err(|e| {
                DiagnosticError::SourceUnavailable(format!("database connection failed: {}", e))
            })?;

        let brokers: Vec<AccountRow> = sqlx::query_as(BROKER_QUERY)
            .fetch_all(&pool)
            .await
            .map_err(|e| {
                DiagnosticError::SourceUnavailable(format!("broker_accounts query failed: {}", e))
            })?;
        debug!(count = brokers.len(), "Loaded broker accounts");

        let followers: Vec<AccountRow> = if self.include_followers {
            sqlx::query_as(FOLLOWER_QUERY)
                .fetch_all(&pool)
                .await
                .map_err(|e| {
                    DiagnosticError::SourceUnavailable(format!("followers query failed: {}", e))
                })?
        } else {
            Vec::new()
        };
        debug!(count = followers.len(), "Loaded follower accounts");

        pool.close().await;

        Ok(brokers
            .into_iter()
            .map(|row| row.into_credential(CredentialKind::Broker))
            .chain(
                followers
                    .into_iter()
                    .map(|row| row.into_credential(CredentialKind::Follower)),
            )
            .collect())
    }
}

/// TOML 자격증명 파일 항목.
#[derive(Debug, Deserialize)]
struct CredentialEntry {
    name: String,
    #[serde(default)]
    kind: CredentialKind,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    credentials: Vec<CredentialEntry>,
}

/// TOML 파일 기반 제공자.
///
/// ```toml
/// [[credentials]]
/// name = "main-broker"
/// kind = "broker"
/// api_key = "..."
/// api_secret = "..."
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialSource {
    path: PathBuf,
}

impl FileCredentialSource {
    /// 파일 경로로 생성.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CredentialSource for FileCredentialSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn list_active_credentials(&self) -> DiagnosticResult<Vec<Credential>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DiagnosticError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let file: CredentialFile = toml::from_str(&content).map_err(|e| {
            DiagnosticError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(file
            .credentials
            .into_iter()
            .map(|entry| {
                Credential::new(entry.name, entry.api_key, entry.api_secret).with_kind(entry.kind)
            })
            .collect())
    }
}

/// 환경변수 기반 단일 자격증명 제공자.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialSource;

#[async_trait]
impl CredentialSource for EnvCredentialSource {
    fn name(&self) -> &str {
        "env"
    }

    async fn list_active_credentials(&self) -> DiagnosticResult<Vec<Credential>> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let api_secret = std::env::var(API_SECRET_ENV).unwrap_or_default();
        Ok(vec![Credential::new("env", api_key, api_secret)])
    }
}
