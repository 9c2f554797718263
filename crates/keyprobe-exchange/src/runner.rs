//! 자격증명 하나에 대한 단계별 진단.

use std::sync::Arc;

use keyprobe_core::{
    credential_span, Credential, CredentialReport, Environment, Stage, StageOutcome, StageRecord,
};
use tracing::{info, warn, Instrument};

use crate::client::ProbeClient;
use crate::probe::ProbeSpec;
use crate::resolver::EnvironmentResolver;
use crate::signer::signature_self_check;

/// 단계별 진단 실행기.
///
/// 모든 단계는 앞 단계의 실패와 무관하게 고정 순서로 실행됩니다.
#[derive(Debug, Clone)]
pub struct DiagnosticRunner {
    client: Arc<ProbeClient>,
    resolver: EnvironmentResolver,
    declared_environment: Environment,
    stages: Vec<Stage>,
}

impl DiagnosticRunner {
    /// 기본 단계로 구성된 실행기 생성.
    ///
    /// 선택 단계(`EnvironmentCheck`)는 [`DiagnosticRunner::with_extra_stages`]로 추가합니다.
    pub fn new(client: Arc<ProbeClient>, declared_environment: Environment) -> Self {
        let stages = Stage::ORDERED
            .into_iter()
            .filter(|stage| !stage.is_optional())
            .collect();

        Self {
            resolver: EnvironmentResolver::new(Arc::clone(&client)),
            client,
            declared_environment,
            stages,
        }
    }

    /// 선택 단계 추가. 실행 순서는 [`Stage::ORDERED`]를 따릅니다.
    pub fn with_extra_stages(mut self, extra: &[Stage]) -> Self {
        self.stages = Stage::ORDERED
            .into_iter()
            .filter(|stage| self.stages.contains(stage) || extra.contains(stage))
            .collect();
        self
    }

    /// 진단 대상 환경.
    pub fn declared_environment(&self) -> Environment {
        self.declared_environment
    }

    /// 실행할 단계 목록.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// 모든 단계를 실행하고 리포트를 생성합니다.
    pub async fn run(&self, credential: &Credential) -> CredentialReport {
        let span = credential_span!("diagnose", credential, self.declared_environment);

        async {
            info!(stages = self.stages.len(), "Starting credential diagnosis");

            let mut records = Vec::with_capacity(self.stages.len());
            // IP 화이트리스트 단계에서 감지한 IP는 이후 인증 단계 결과에도 포함
            let mut public_ip = None;
            for stage in &self.stages {
                let outcome = self.run_stage(*stage, credential, &mut public_ip).await;
                if outcome.passed() {
                    info!(stage = stage.name(), "Stage passed");
                } else {
                    warn!(stage = stage.name(), "Stage failed");
                }
                records.push(StageRecord {
                    stage: *stage,
                    outcome,
                });
            }

            let report = CredentialReport::from_stages(self.declared_environment, records);
            info!(
                authenticated = report.authenticated(),
                passed = report.passed_count(),
                total = report.stages().len(),
                "Credential diagnosis finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    /// 단계 하나 실행.
    async fn run_stage(
        &self,
        stage: Stage,
        credential: &Credential,
        public_ip: &mut Option<String>,
    ) -> StageOutcome {
        let environment = self.declared_environment;

        match stage {
            Stage::PublicEndpoint => StageOutcome::Probe(
                self.client
                    .probe(environment, credential, ProbeSpec::PublicProducts)
                    .await,
            ),
            Stage::SignatureSelfCheck => StageOutcome::SelfCheck {
                passed: signature_self_check(),
            },
            Stage::EnvironmentCheck => {
                StageOutcome::Environment(self.resolver.resolve(credential).await)
            }
            Stage::IpWhitelist => {
                *public_ip = match self.client.public_ip().await {
                    Ok(ip) => {
                        info!(public_ip = %ip, "Detected public IP");
                        Some(ip)
                    }
                    Err(cause) => {
                        warn!(%cause, "Public IP lookup failed");
                        None
                    }
                };

                StageOutcome::Probe(
                    self.client
                        .probe_with_public_ip(
                            environment,
                            credential,
                            ProbeSpec::Profile,
                            public_ip.as_deref(),
                        )
                        .await,
                )
            }
            Stage::Authentication => StageOutcome::Probe(
                self.client
                    .probe_with_public_ip(
                        environment,
                        credential,
                        ProbeSpec::WalletBalances,
                        public_ip.as_deref(),
                    )
                    .await,
            ),
            Stage::TradingPermissions => StageOutcome::Probe(
                self.client
                    .probe_with_public_ip(
                        environment,
                        credential,
                        ProbeSpec::OpenOrders,
                        public_ip.as_deref(),
                    )
                    .await,
            ),
        }
    }
}
