//! 단일 프로브 호출의 분류 결과.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 성공 응답의 요약.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PayloadSummary {
    /// 응답 `result` 배열의 항목 수 (배열이 아니면 `None`)
    pub result_count: Option<usize>,
}

impl PayloadSummary {
    /// 항목 수를 가진 요약 생성.
    pub fn with_count(count: usize) -> Self {
        Self {
            result_count: Some(count),
        }
    }
}

impl fmt::Display for PayloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result_count {
            Some(count) => write!(f, "{} entries", count),
            None => f.write_str("ok"),
        }
    }
}

/// 전송 계층 실패 원인.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum NetworkCause {
    /// 제한 시간 초과
    Timeout,
    /// 연결 실패 (연결 거부, DNS 실패 등)
    Connect(String),
    /// 그 외 전송 실패
    Other(String),
}

impl fmt::Display for NetworkCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkCause::Timeout => f.write_str("timeout"),
            NetworkCause::Connect(msg) => write!(f, "connect: {}", msg),
            NetworkCause::Other(msg) => write!(f, "{}", msg),
        }
    }
}

/// 엔드포인트 한 번 호출의 분류 결과.
///
/// 모든 결과는 정확히 하나의 변형에 속합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// HTTP 200
    Success(PayloadSummary),
    /// 잘못된 키/서명
    AuthFailure { detail: String },
    /// IP 화이트리스트 미등록 (감지된 공인 IP 포함)
    NotWhitelisted { public_ip: Option<String> },
    /// 연결/타임아웃 실패
    NetworkError { cause: NetworkCause },
    /// 예상하지 못한 응답 (원문 그대로 보존)
    Inconclusive { status: u16, body: String },
}

impl ProbeOutcome {
    /// 성공 여부.
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }

    /// 결과 태그 이름.
    pub fn tag(&self) -> &'static str {
        match self {
            ProbeOutcome::Success(_) => "success",
            ProbeOutcome::AuthFailure { .. } => "auth_failure",
            ProbeOutcome::NotWhitelisted { .. } => "not_whitelisted",
            ProbeOutcome::NetworkError { .. } => "network_error",
            ProbeOutcome::Inconclusive { .. } => "inconclusive",
        }
    }

    /// 타임아웃 결과 생성.
    pub fn timeout() -> Self {
        ProbeOutcome::NetworkError {
            cause: NetworkCause::Timeout,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Success(summary) => write!(f, "success ({})", summary),
            ProbeOutcome::AuthFailure { detail } => write!(f, "auth failure: {}", detail),
            ProbeOutcome::NotWhitelisted { public_ip } => match public_ip {
                Some(ip) => write!(f, "ip {} not whitelisted", ip),
                None => f.write_str("ip not whitelisted"),
            },
            ProbeOutcome::NetworkError { cause } => write!(f, "network error: {}", cause),
            ProbeOutcome::Inconclusive { status, body } => {
                write!(f, "inconclusive (HTTP {}): {}", status, body)
            }
        }
    }
}
