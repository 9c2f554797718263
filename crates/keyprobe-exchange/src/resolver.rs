//! 자격증명이 속한 네트워크 환경 판별.
//!
//! 거래소는 환경별로 키를 발급하므로 테스트넷 키는 운영 환경에서 거부됩니다.
//! 모든 환경을 우선순위 순서대로 시도해 이 실패 유형을 서명/인증 문제와 구분합니다.

use std::sync::Arc;

use keyprobe_core::{Credential, Environment, EnvironmentAttempt, EnvironmentResolution};
use tracing::{debug, info, warn};

use crate::client::ProbeClient;
use crate::probe::ProbeSpec;

/// 환경 판별기.
#[derive(Debug, Clone)]
pub struct EnvironmentResolver {
    client: Arc<ProbeClient>,
}

impl EnvironmentResolver {
    /// 새 판별기 생성.
    pub fn new(client: Arc<ProbeClient>) -> Self {
        Self { client }
    }

    /// 모든 환경에서 자격증명을 시도합니다.
    ///
    /// 공개 엔드포인트가 실패한 환경은 다운된 것으로 보고 건너뜁니다.
    /// 둘 이상의 환경이 수락하면 하나를 고르지 않고 모두 보고합니다.
    pub async fn resolve(&self, credential: &Credential) -> EnvironmentResolution {
        let mut attempts = Vec::with_capacity(Environment::ALL.len());

        for environment in Environment::ALL {
            attempts.push(self.attempt(environment, credential).await);
        }

        let resolution = EnvironmentResolution::from_attempts(attempts);
        match resolution.resolved() {
            Some(environment) => info!(%environment, "Credential accepted by a single environment"),
            None if resolution.matched().is_empty() => {
                warn!("Credential not accepted by any environment")
            }
            None => warn!(
                environments = ?resolution.matched(),
                "Credential accepted by multiple environments"
            ),
        }
        resolution
    }

    /// 한 환경에 대한 시도.
    async fn attempt(&self, environment: Environment, credential: &Credential) -> EnvironmentAttempt {
        let public = self
            .client
            .probe_environment(environment, credential, ProbeSpec::PublicProducts)
            .await;

        if !public.is_success() {
            debug!(%environment, outcome = %public, "Public endpoint failed, skipping environment");
            return EnvironmentAttempt {
                environment,
                public,
                profile: None,
            };
        }

        // 상태 코드만으로 판단 (응답 내용은 검증하지 않음)
        let profile = self
            .client
            .probe_environment(environment, credential, ProbeSpec::Profile)
            .await;
        debug!(%environment, outcome = %profile, "Profile probe finished");

        EnvironmentAttempt {
            environment,
            public,
            profile: Some(profile),
        }
    }
}
