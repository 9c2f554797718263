//! 진단 엔진의 에러 타입.
//!
//! 개별 프로브의 실패는 에러가 아니라 [`crate::ProbeOutcome`] 데이터로 기록됩니다.
//! 이 모듈의 에러는 진단 실행 자체를 중단시키는 조건만 다룹니다.

use thiserror::Error;

/// 진단 실행 에러.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    /// 자격증명 저장소에 접근할 수 없음 (플릿 실행 전체에 치명적)
    #[error("자격증명 저장소 사용 불가: {0}")]
    SourceUnavailable(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// HTTP 클라이언트 생성 에러
    #[error("HTTP 클라이언트 에러: {0}")]
    Http(String),

    /// 리포트 출력 에러
    #[error("리포트 출력 에러: {0}")]
    Sink(String),
}

/// 진단 작업을 위한 Result 타입.
pub type DiagnosticResult<T> = Result<T, DiagnosticError>;

impl DiagnosticError {
    /// 플릿 실행 전체를 중단시키는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiagnosticError::SourceUnavailable(_)
                | DiagnosticError::Config(_)
                | DiagnosticError::Http(_)
        )
    }
}

impl From<config::ConfigError> for DiagnosticError {
    fn from(err: config::ConfigError) -> Self {
        DiagnosticError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DiagnosticError {
    fn from(err: serde_json::Error) -> Self {
        DiagnosticError::Sink(err.to_string())
    }
}
