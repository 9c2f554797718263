//! 플릿 전체 진단 및 집계.

use futures::stream::{self, StreamExt};
use keyprobe_core::{
    Credential, CredentialReport, CredentialSource, DiagnosticResult, FleetEntry, FleetReport,
    ReportSink,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::runner::DiagnosticRunner;

/// 플릿 진단 집계기.
///
/// 결과는 항상 입력 자격증명 순서를 유지합니다. `concurrency`가 1보다 크면
/// 여러 자격증명을 동시에 진단하지만 결과 순서와 분류는 순차 실행과 같습니다.
#[derive(Debug, Clone)]
pub struct FleetAggregator {
    runner: DiagnosticRunner,
    concurrency: usize,
}

impl FleetAggregator {
    /// 순차 실행 집계기 생성.
    pub fn new(runner: DiagnosticRunner) -> Self {
        Self {
            runner,
            concurrency: 1,
        }
    }

    /// 동시에 진단할 자격증명 수 지정 (최소 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 자격증명 목록을 진단합니다.
    pub async fn run_fleet(
        &self,
        credentials: Vec<Credential>,
        cancel: &CancellationToken,
    ) -> FleetReport {
        self.collect(credentials, None, cancel).await
    }

    /// 자격증명 목록을 진단하며 결과를 출력 대상에 전달합니다.
    ///
    /// 항목 단위 출력 실패는 경고만 남기고 진단을 계속합니다.
    pub async fn run_with_sink(
        &self,
        credentials: Vec<Credential>,
        sink: &dyn ReportSink,
        cancel: &CancellationToken,
    ) -> DiagnosticResult<FleetReport> {
        let report = self.collect(credentials, Some(sink), cancel).await;
        sink.fleet_completed(&report).await?;
        Ok(report)
    }

    /// 자격증명 제공자에서 목록을 받아 진단합니다.
    ///
    /// # Errors
    /// 제공자가 실패하면 어떤 자격증명도 진단하지 않고 즉시 에러를 반환합니다.
    pub async fn run_from_source(
        &self,
        source: &dyn CredentialSource,
        sink: &dyn ReportSink,
        cancel: &CancellationToken,
    ) -> DiagnosticResult<FleetReport> {
        let credentials = source.list_active_credentials().await.map_err(|e| {
            error!(source = source.name(), error = %e, "Credential source unavailable");
            e
        })?;

        info!(
            source = source.name(),
            count = credentials.len(),
            "Loaded credentials"
        );

        self.run_with_sink(credentials, sink, cancel).await
    }

    async fn collect(
        &self,
        credentials: Vec<Credential>,
        sink: Option<&dyn ReportSink>,
        cancel: &CancellationToken,
    ) -> FleetReport {
        let total = credentials.len();
        if let Some(sink) = sink {
            if let Err(e) = sink.fleet_started(total).await {
                warn!(error = %e, "Report sink failed");
            }
        }

        let mut entries = Vec::with_capacity(total);
        let mut interrupted = false;

        let mut results = stream::iter(credentials.into_iter().map(|credential| {
            let cancel = cancel.clone();
            async move {
                // 다음 자격증명을 시작하기 전에만 중단 여부를 확인
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.diagnose(credential).await)
            }
        }))
        .buffered(self.concurrency);

        while let Some(result) = results.next().await {
            let Some(entry) = result else {
                interrupted = true;
                break;
            };

            if let Some(sink) = sink {
                if let Err(e) = sink.credential_completed(&entry).await {
                    warn!(credential = %entry.identifier, error = %e, "Report sink failed");
                }
            }
            entries.push(entry);
        }

        if interrupted {
            warn!(
                completed = entries.len(),
                total, "Fleet run interrupted before all credentials were diagnosed"
            );
        }

        let report = FleetReport::new(entries, interrupted);
        info!(
            working = report.working_count(),
            total = report.total_count(),
            success_rate = report.success_rate_pct(),
            "Fleet diagnosis finished"
        );
        report
    }

    /// 자격증명 하나를 진단합니다. 키/시크릿이 없으면 네트워크 호출 없이 분류합니다.
    async fn diagnose(&self, credential: Credential) -> FleetEntry {
        let report = if credential.is_complete() {
            self.runner.run(&credential).await
        } else {
            warn!(
                credential = credential.identifier(),
                "Missing API key or secret, skipping probes"
            );
            CredentialReport::no_credentials(self.runner.declared_environment())
        };

        FleetEntry {
            identifier: credential.identifier().to_string(),
            kind: credential.kind(),
            masked_key: credential.masked_key(),
            report,
        }
    }
}
