//! 인증 요청 헤더 구성.

use chrono::Utc;
use keyprobe_core::Credential;
use reqwest::Method;
use secrecy::ExposeSecret;

use crate::signer::{canonical_message, sign};

/// JSON 요청 Content-Type.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// 인증 요청 헤더 집합.
///
/// `timestamp`는 서명 메시지에 들어간 값과 정확히 같습니다.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// `api-key` 헤더
    pub api_key: String,
    /// `timestamp` 헤더 (Unix 초, 10진수)
    pub timestamp: String,
    /// `signature` 헤더 (소문자 16진수)
    pub signature: String,
    /// `Content-Type` 헤더
    pub content_type: &'static str,
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("api_key", &keyprobe_core::mask_key(&self.api_key))
            .field("timestamp", &self.timestamp)
            .field("signature", &format!("{}...", self.signature.get(..16).unwrap_or("")))
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl AuthHeaders {
    /// 헤더 이름과 값 목록 (요청 적용 순서).
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("api-key", self.api_key.as_str()),
            ("timestamp", self.timestamp.as_str()),
            ("signature", self.signature.as_str()),
            ("Content-Type", self.content_type),
        ]
    }
}

/// 인증 헤더 생성기.
///
/// 시스템 시계 읽기 외에는 부작용이 없습니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestComposer;

impl RequestComposer {
    /// 현재 시각으로 인증 헤더를 생성합니다.
    ///
    /// `path`는 호스트를 포함하지 않으며, `query_string`은 비어 있지 않으면 선행 `?`를 포함합니다.
    pub fn build_headers(
        credential: &Credential,
        method: &Method,
        path: &str,
        query_string: &str,
        body: &str,
    ) -> AuthHeaders {
        Self::build_headers_at(
            credential,
            method,
            path,
            query_string,
            body,
            Self::timestamp_secs(),
        )
    }

    /// 지정한 타임스탬프로 인증 헤더를 생성합니다.
    pub fn build_headers_at(
        credential: &Credential,
        method: &Method,
        path: &str,
        query_string: &str,
        body: &str,
        timestamp: i64,
    ) -> AuthHeaders {
        let timestamp = timestamp.to_string();
        let message = canonical_message(method.as_str(), &timestamp, path, query_string, body);
        let signature = sign(credential.api_secret().expose_secret(), &message);

        AuthHeaders {
            api_key: credential.api_key().to_string(),
            timestamp,
            signature,
            content_type: CONTENT_TYPE_JSON,
        }
    }

    /// 현재 Unix 시각 (초).
    fn timestamp_secs() -> i64 {
        Utc::now().timestamp()
    }
}
