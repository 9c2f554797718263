//! 거래소 호출 에러 타입.

use keyprobe_core::{DiagnosticError, NetworkCause};
use thiserror::Error;

/// 프로브 클라이언트 구성 에러.
///
/// 개별 호출 실패는 에러가 아니라 `ProbeOutcome`으로 분류됩니다.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// HTTP 클라이언트 생성 실패
    #[error("HTTP client error: {0}")]
    Client(String),

    /// 헤더 값으로 사용할 수 없는 문자열
    #[error("Invalid header value for {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },
}

impl From<ProbeError> for DiagnosticError {
    fn from(err: ProbeError) -> Self {
        DiagnosticError::Http(err.to_string())
    }
}

/// 전송 계층 에러를 실패 원인으로 분류.
///
/// 타임아웃을 가장 먼저 확인합니다. 연결 단계의 타임아웃도 타임아웃으로 분류됩니다.
pub fn network_cause(err: &reqwest::Error) -> NetworkCause {
    if err.is_timeout() {
        NetworkCause::Timeout
    } else if err.is_connect() {
        NetworkCause::Connect(err.to_string())
    } else {
        NetworkCause::Other(err.to_string())
    }
}
