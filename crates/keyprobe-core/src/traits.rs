//! 진단 엔진의 외부 협력자 계약.
//!
//! 자격증명 저장 방식과 결과 출력 방식은 엔진의 관심사가 아닙니다.
//! 엔진은 이 trait들을 통해서만 협력자와 상호작용합니다.

use async_trait::async_trait;

use crate::{Credential, DiagnosticResult, FleetEntry, FleetReport};

/// 진단 대상 자격증명 제공자.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// 제공자 이름 (로그용).
    fn name(&self) -> &str;

    /// 활성/검증된 계정의 자격증명을 순서대로 반환.
    ///
    /// # Errors
    /// 저장소에 접근할 수 없으면 `DiagnosticError::SourceUnavailable`을 반환합니다.
    /// 이 에러는 플릿 실행 전체에 치명적입니다.
    async fn list_active_credentials(&self) -> DiagnosticResult<Vec<Credential>>;
}

/// 진단 결과 출력 대상.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// 플릿 진단 시작 시 호출.
    async fn fleet_started(&self, _total: usize) -> DiagnosticResult<()> {
        Ok(())
    }

    /// 자격증명 하나의 진단이 끝났을 때 호출 (입력 순서대로).
    async fn credential_completed(&self, entry: &FleetEntry) -> DiagnosticResult<()>;

    /// 플릿 전체 진단이 끝났을 때 호출.
    async fn fleet_completed(&self, report: &FleetReport) -> DiagnosticResult<()>;
}

/// 메모리에 보관된 자격증명 목록.
pub struct StaticCredentialSource {
    credentials: std::sync::Mutex<Option<Vec<Credential>>>,
}

impl StaticCredentialSource {
    /// 자격증명 목록으로 생성.
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials: std::sync::Mutex::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentialSource {
    fn name(&self) -> &str {
        "static"
    }

    /// 보관된 목록을 넘겨줍니다. 두 번째 호출부터는 빈 목록입니다.
    async fn list_active_credentials(&self) -> DiagnosticResult<Vec<Credential>> {
        let mut guard = self
            .credentials
            .lock()
            .map_err(|e| crate::DiagnosticError::SourceUnavailable(e.to_string()))?;
        Ok(guard.take().unwrap_or_default())
    }
}
