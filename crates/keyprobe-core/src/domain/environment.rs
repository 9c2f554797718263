//! 거래소 네트워크 환경.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 운영 환경 기본 REST URL.
pub const DEFAULT_PRODUCTION_URL: &str = "https://api.india.delta.exchange";
/// 테스트넷 기본 REST URL.
pub const DEFAULT_TESTNET_URL: &str = "https://cdn-ind.testnet.deltaex.org";

/// 거래소 네트워크 환경.
///
/// 닫힌 집합입니다. 자격증명은 환경별로 발급되며 다른 환경에서는 거부됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// 운영 환경
    #[default]
    Production,
    /// 테스트넷
    Testnet,
}

impl Environment {
    /// 환경 판별 시 시도하는 우선순위 순서.
    pub const ALL: [Environment; 2] = [Environment::Production, Environment::Testnet];

    /// 설정/CLI에서 사용하는 이름.
    pub fn name(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" | "mainnet" => Ok(Self::Production),
            "testnet" | "test" => Ok(Self::Testnet),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

/// 환경별 REST 기본 URL 바인딩.
///
/// 환경 집합은 고정이며 URL만 설정으로 바꿀 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentEndpoints {
    /// 운영 환경 URL
    pub production: String,
    /// 테스트넷 URL
    pub testnet: String,
}

impl Default for EnvironmentEndpoints {
    fn default() -> Self {
        Self {
            production: DEFAULT_PRODUCTION_URL.to_string(),
            testnet: DEFAULT_TESTNET_URL.to_string(),
        }
    }
}

impl EnvironmentEndpoints {
    /// 새 바인딩 생성.
    pub fn new(production: impl Into<String>, testnet: impl Into<String>) -> Self {
        Self {
            production: production.into(),
            testnet: testnet.into(),
        }
    }

    /// 환경의 REST 기본 URL (끝의 `/` 제거).
    pub fn base_url(&self, environment: Environment) -> &str {
        let url = match environment {
            Environment::Production => &self.production,
            Environment::Testnet => &self.testnet,
        };
        url.trim_end_matches('/')
    }
}
