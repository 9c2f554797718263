//! 거래 계정의 API 자격증명.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 마스킹 없이 노출할 API 키 앞부분 길이.
const KEY_PREFIX_LEN: usize = 8;
/// 마스킹 없이 노출할 API 키 뒷부분 길이.
const KEY_SUFFIX_LEN: usize = 4;

/// 자격증명이 속한 계정 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// 마스터(브로커) 계정
    #[default]
    Broker,
    /// 팔로워 계정
    Follower,
}

impl CredentialKind {
    /// 모든 계정 유형 (리포트 출력 순서).
    pub const ALL: [CredentialKind; 2] = [CredentialKind::Broker, CredentialKind::Follower];

    /// 표시용 이름.
    pub fn label(&self) -> &'static str {
        match self {
            CredentialKind::Broker => "broker",
            CredentialKind::Follower => "follower",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CredentialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "broker" => Ok(Self::Broker),
            "follower" => Ok(Self::Follower),
            _ => Err(format!("Unknown credential kind: {}", s)),
        }
    }
}

/// 하나의 거래 계정을 식별하는 API 키/시크릿 쌍.
///
/// 생성 후에는 변경할 수 없습니다.
///
/// # 보안
/// - 시크릿은 [`SecretString`]으로 보관되며 서명 계산 외에는 노출되지 않습니다.
/// - `Debug` 구현은 API 키를 마스킹하고 시크릿을 출력하지 않습니다.
pub struct Credential {
    identifier: String,
    kind: CredentialKind,
    api_key: String,
    api_secret: SecretString,
}

impl Credential {
    /// 새 자격증명 생성 (브로커 계정).
    pub fn new(
        identifier: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            kind: CredentialKind::Broker,
            api_key: api_key.into(),
            api_secret: SecretString::new(api_secret.into().into_boxed_str()),
        }
    }

    /// 계정 유형 지정.
    pub fn with_kind(mut self, kind: CredentialKind) -> Self {
        self.kind = kind;
        self
    }

    /// 계정 식별자 (계정 이름 등).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// 계정 유형.
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// API 키 원문.
    ///
    /// 요청 헤더 구성에만 사용해야 합니다. 로그에는 [`Credential::masked_key`]를 사용하세요.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// 서명 계산용 시크릿.
    pub fn api_secret(&self) -> &SecretString {
        &self.api_secret
    }

    /// 키와 시크릿이 모두 설정되어 있는지 확인.
    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_secret.expose_secret().trim().is_empty()
    }

    /// 진단 출력용으로 마스킹된 API 키.
    ///
    /// 앞 8자와 뒤 4자만 노출합니다. 12자 이하의 키는 전부 가립니다.
    pub fn masked_key(&self) -> String {
        mask_key(&self.api_key)
    }
}

/// API 키 마스킹.
pub fn mask_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.is_empty() {
        return "NOT SET".to_string();
    }
    if chars.len() <= KEY_PREFIX_LEN + KEY_SUFFIX_LEN {
        return "***REDACTED***".to_string();
    }

    let prefix: String = chars[..KEY_PREFIX_LEN].iter().collect();
    let suffix: String = chars[chars.len() - KEY_SUFFIX_LEN..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret_state = if self.api_secret.expose_secret().is_empty() {
            "NOT SET"
        } else {
            "***REDACTED***"
        };

        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("kind", &self.kind)
            .field("api_key", &self.masked_key())
            .field("api_secret", &secret_state)
            .finish()
    }
}
