//! 자격증명별 진단 리포트 및 플릿 요약.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::{CredentialKind, Environment, ProbeOutcome};

// ============================================================================
// 진단 단계
// ============================================================================

/// 진단 단계.
///
/// 실행 순서는 [`Stage::ORDERED`]로 고정됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// 공개 엔드포인트 연결 확인
    PublicEndpoint,
    /// 알려진 벡터로 서명 구현 자체 검증
    SignatureSelfCheck,
    /// 자격증명이 속한 환경 판별 (선택 단계)
    EnvironmentCheck,
    /// IP 화이트리스트 확인
    IpWhitelist,
    /// 인증 (지갑 잔고 조회)
    Authentication,
    /// 거래 권한 (미체결 주문 조회)
    TradingPermissions,
}

impl Stage {
    /// 고정 실행 순서.
    pub const ORDERED: [Stage; 6] = [
        Stage::PublicEndpoint,
        Stage::SignatureSelfCheck,
        Stage::EnvironmentCheck,
        Stage::IpWhitelist,
        Stage::Authentication,
        Stage::TradingPermissions,
    ];

    /// 러너에 명시적으로 추가해야 실행되는 단계인지 여부.
    pub fn is_optional(&self) -> bool {
        matches!(self, Stage::EnvironmentCheck)
    }

    /// 단계 이름.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::PublicEndpoint => "public_endpoint",
            Stage::SignatureSelfCheck => "signature_self_check",
            Stage::EnvironmentCheck => "environment_check",
            Stage::IpWhitelist => "ip_whitelist",
            Stage::Authentication => "authentication",
            Stage::TradingPermissions => "trading_permissions",
        }
    }

    /// 표시용 제목.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::PublicEndpoint => "Public Endpoint",
            Stage::SignatureSelfCheck => "Signature Generation",
            Stage::EnvironmentCheck => "Environment Check",
            Stage::IpWhitelist => "IP Whitelist",
            Stage::Authentication => "Authentication",
            Stage::TradingPermissions => "Trading Permissions",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// 환경 판별 결과
// ============================================================================

/// 한 환경에 대한 판별 시도.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentAttempt {
    /// 시도한 환경
    pub environment: Environment,
    /// 공개 엔드포인트 결과
    pub public: ProbeOutcome,
    /// 프로필 조회 결과 (공개 엔드포인트 실패 시 `None`)
    pub profile: Option<ProbeOutcome>,
}

impl EnvironmentAttempt {
    /// 공개 엔드포인트가 실패해 건너뛴 환경인지 여부.
    pub fn was_skipped(&self) -> bool {
        self.profile.is_none()
    }

    /// 인증 프로브가 성공했는지 여부.
    pub fn profile_succeeded(&self) -> bool {
        self.profile.as_ref().is_some_and(ProbeOutcome::is_success)
    }
}

/// 환경 판별 판정.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "environments", rename_all = "snake_case")]
pub enum EnvironmentVerdict {
    /// 정확히 하나의 환경이 자격증명을 수락
    Resolved(Environment),
    /// 둘 이상의 환경이 수락 (임의로 선택하지 않음)
    Ambiguous(Vec<Environment>),
    /// 어떤 환경도 수락하지 않음
    NoMatch,
}

/// 환경 판별 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentResolution {
    attempts: Vec<EnvironmentAttempt>,
    verdict: EnvironmentVerdict,
}

impl EnvironmentResolution {
    /// 시도 목록에서 판정을 계산합니다.
    pub fn from_attempts(attempts: Vec<EnvironmentAttempt>) -> Self {
        let matched: Vec<Environment> = attempts
            .iter()
            .filter(|a| a.profile_succeeded())
            .map(|a| a.environment)
            .collect();

        let verdict = match matched.as_slice() {
            [] => EnvironmentVerdict::NoMatch,
            [single] => EnvironmentVerdict::Resolved(*single),
            _ => EnvironmentVerdict::Ambiguous(matched),
        };

        Self { attempts, verdict }
    }

    /// 환경별 시도 (우선순위 순서).
    pub fn attempts(&self) -> &[EnvironmentAttempt] {
        &self.attempts
    }

    /// 판정.
    pub fn verdict(&self) -> &EnvironmentVerdict {
        &self.verdict
    }

    /// 자격증명을 수락한 모든 환경.
    pub fn matched(&self) -> Vec<Environment> {
        match &self.verdict {
            EnvironmentVerdict::Resolved(env) => vec![*env],
            EnvironmentVerdict::Ambiguous(envs) => envs.clone(),
            EnvironmentVerdict::NoMatch => Vec::new(),
        }
    }

    /// 단일 환경으로 판별된 경우 그 환경.
    pub fn resolved(&self) -> Option<Environment> {
        match self.verdict {
            EnvironmentVerdict::Resolved(env) => Some(env),
            _ => None,
        }
    }
}

// ============================================================================
// 단계 결과 및 자격증명 리포트
// ============================================================================

/// 한 단계의 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum StageOutcome {
    /// 엔드포인트 프로브 결과
    Probe(ProbeOutcome),
    /// 서명 자체 검증 결과
    SelfCheck { passed: bool },
    /// 환경 판별 결과
    Environment(EnvironmentResolution),
}

impl StageOutcome {
    /// 단계 통과 여부.
    pub fn passed(&self) -> bool {
        match self {
            StageOutcome::Probe(outcome) => outcome.is_success(),
            StageOutcome::SelfCheck { passed } => *passed,
            StageOutcome::Environment(resolution) => {
                resolution.verdict() != &EnvironmentVerdict::NoMatch
            }
        }
    }

    /// 프로브 결과인 경우 반환.
    pub fn as_probe(&self) -> Option<&ProbeOutcome> {
        match self {
            StageOutcome::Probe(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// 단계와 그 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// 자격증명 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialStatus {
    /// 키 또는 시크릿 누락 (프로브 미실행)
    NoCredentials,
    /// 인증 성공
    Working,
    /// 인증 실패
    Failed,
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialStatus::NoCredentials => f.write_str("NO CREDENTIALS"),
            CredentialStatus::Working => f.write_str("WORKING"),
            CredentialStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// 한 자격증명의 진단 리포트.
///
/// 실행마다 새로 만들어지며 `authenticated`는 인증 단계 결과에서만 파생됩니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialReport {
    declared_environment: Environment,
    stages: Vec<StageRecord>,
    authenticated: bool,
    missing_credentials: bool,
    environment_mismatch: Option<Environment>,
    generated_at: DateTime<Utc>,
}

impl CredentialReport {
    /// 단계 결과로부터 리포트 생성.
    pub fn from_stages(declared_environment: Environment, stages: Vec<StageRecord>) -> Self {
        let authenticated = stages.iter().any(|record| {
            record.stage == Stage::Authentication
                && record.outcome.as_probe().is_some_and(ProbeOutcome::is_success)
        });

        let environment_mismatch = stages
            .iter()
            .find_map(|record| match &record.outcome {
                StageOutcome::Environment(resolution) => resolution.resolved(),
                _ => None,
            })
            .filter(|resolved| *resolved != declared_environment);

        Self {
            declared_environment,
            stages,
            authenticated,
            missing_credentials: false,
            environment_mismatch,
            generated_at: Utc::now(),
        }
    }

    /// 키/시크릿 누락으로 프로브를 실행하지 않은 합성 리포트.
    pub fn no_credentials(declared_environment: Environment) -> Self {
        Self {
            declared_environment,
            stages: Vec::new(),
            authenticated: false,
            missing_credentials: true,
            environment_mismatch: None,
            generated_at: Utc::now(),
        }
    }

    /// 운영자가 선택한 환경.
    pub fn declared_environment(&self) -> Environment {
        self.declared_environment
    }

    /// 실행 순서대로의 단계 결과.
    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    /// 특정 단계의 결과.
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|record| record.stage == stage)
            .map(|record| &record.outcome)
    }

    /// 특정 단계의 프로브 결과.
    pub fn probe_outcome(&self, stage: Stage) -> Option<&ProbeOutcome> {
        self.outcome(stage).and_then(StageOutcome::as_probe)
    }

    /// 인증 단계 성공 여부.
    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    /// 키가 다른 환경에서만 동작하는 경우 그 환경.
    pub fn environment_mismatch(&self) -> Option<Environment> {
        self.environment_mismatch
    }

    /// 리포트 생성 시각.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// 통과한 단계 수.
    pub fn passed_count(&self) -> usize {
        self.stages.iter().filter(|r| r.outcome.passed()).count()
    }

    /// 자격증명 분류.
    pub fn status(&self) -> CredentialStatus {
        if self.missing_credentials {
            CredentialStatus::NoCredentials
        } else if self.authenticated {
            CredentialStatus::Working
        } else {
            CredentialStatus::Failed
        }
    }
}

// ============================================================================
// 플릿 리포트
// ============================================================================

/// 플릿 리포트의 한 항목.
///
/// 직렬화 시 분류(`status`)를 함께 기록합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetEntry {
    /// 자격증명 식별자
    pub identifier: String,
    /// 계정 유형
    pub kind: CredentialKind,
    /// 마스킹된 API 키
    pub masked_key: String,
    /// 진단 리포트
    pub report: CredentialReport,
}

impl FleetEntry {
    /// 항목 분류.
    pub fn status(&self) -> CredentialStatus {
        self.report.status()
    }
}

impl Serialize for FleetEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FleetEntry", 5)?;
        state.serialize_field("identifier", &self.identifier)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("masked_key", &self.masked_key)?;
        state.serialize_field("status", &self.status())?;
        state.serialize_field("report", &self.report)?;
        state.end()
    }
}

/// 플릿 전체 상태 판정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetHealth {
    /// 진단 대상 없음
    Empty,
    /// 동작하는 자격증명 없음
    NoneWorking,
    /// 일부만 동작
    Partial,
    /// 모두 동작
    AllWorking,
}

/// 계정 유형별 집계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KindCounts {
    pub working: usize,
    pub total: usize,
}

/// 플릿 진단 결과.
///
/// 항목은 입력 자격증명 순서를 유지합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetReport {
    entries: Vec<FleetEntry>,
    working_count: usize,
    total_count: usize,
    interrupted: bool,
    generated_at: DateTime<Utc>,
}

impl FleetReport {
    /// 항목 목록으로부터 리포트 생성.
    pub fn new(entries: Vec<FleetEntry>, interrupted: bool) -> Self {
        let working_count = entries
            .iter()
            .filter(|e| e.report.authenticated())
            .count();
        let total_count = entries.len();

        Self {
            entries,
            working_count,
            total_count,
            interrupted,
            generated_at: Utc::now(),
        }
    }

    /// 입력 순서대로의 항목.
    pub fn entries(&self) -> &[FleetEntry] {
        &self.entries
    }

    /// 인증에 성공한 자격증명 수.
    pub fn working_count(&self) -> usize {
        self.working_count
    }

    /// 전체 자격증명 수 (자격증명 누락 항목 포함).
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// 인증에 실패한 자격증명 수.
    pub fn failed_count(&self) -> usize {
        self.count_status(CredentialStatus::Failed)
    }

    /// 자격증명이 누락된 항목 수.
    pub fn no_credentials_count(&self) -> usize {
        self.count_status(CredentialStatus::NoCredentials)
    }

    fn count_status(&self, status: CredentialStatus) -> usize {
        self.entries.iter().filter(|e| e.status() == status).count()
    }

    /// 중단 신호로 일부 자격증명을 건너뛰었는지 여부.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// 리포트 생성 시각.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// 성공률 (0.0 ~ 1.0). 항목이 없으면 0.
    pub fn success_rate(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        self.working_count as f64 / self.total_count as f64
    }

    /// 소수점 첫째 자리로 반올림한 성공률 백분율.
    pub fn success_rate_pct(&self) -> f64 {
        (self.success_rate() * 1000.0).round() / 10.0
    }

    /// 계정 유형별 집계.
    pub fn counts_by_kind(&self, kind: CredentialKind) -> KindCounts {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .fold(KindCounts::default(), |mut acc, e| {
                acc.total += 1;
                if e.report.authenticated() {
                    acc.working += 1;
                }
                acc
            })
    }

    /// 플릿 상태 판정.
    pub fn health(&self) -> FleetHealth {
        if self.total_count == 0 {
            FleetHealth::Empty
        } else if self.working_count == 0 {
            FleetHealth::NoneWorking
        } else if self.working_count < self.total_count {
            FleetHealth::Partial
        } else {
            FleetHealth::AllWorking
        }
    }
}

impl Serialize for FleetReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FleetReport", 7)?;
        state.serialize_field("working_count", &self.working_count)?;
        state.serialize_field("total_count", &self.total_count)?;
        state.serialize_field("success_rate", &self.success_rate_pct())?;
        state.serialize_field("health", &self.health())?;
        state.serialize_field("interrupted", &self.interrupted)?;
        state.serialize_field("generated_at", &self.generated_at)?;
        state.serialize_field("entries", &self.entries)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PayloadSummary;

    fn probe(stage: Stage, outcome: ProbeOutcome) -> StageRecord {
        StageRecord {
            stage,
            outcome: StageOutcome::Probe(outcome),
        }
    }

    fn success() -> ProbeOutcome {
        ProbeOutcome::Success(PayloadSummary::default())
    }

    fn auth_failure() -> ProbeOutcome {
        ProbeOutcome::AuthFailure {
            detail: "invalid_api_key".to_string(),
        }
    }

    fn entry(name: &str, kind: CredentialKind, report: CredentialReport) -> FleetEntry {
        FleetEntry {
            identifier: name.to_string(),
            kind,
            masked_key: "***REDACTED***".to_string(),
            report,
        }
    }

    #[test]
    fn test_authenticated_derives_from_authentication_stage_only() {
        let report = CredentialReport::from_stages(
            Environment::Production,
            vec![
                probe(Stage::PublicEndpoint, auth_failure()),
                probe(Stage::Authentication, success()),
                probe(Stage::TradingPermissions, auth_failure()),
            ],
        );
        assert!(report.authenticated());
        assert_eq!(report.status(), CredentialStatus::Working);

        let report = CredentialReport::from_stages(
            Environment::Production,
            vec![
                probe(Stage::PublicEndpoint, success()),
                probe(Stage::IpWhitelist, success()),
                probe(Stage::Authentication, auth_failure()),
            ],
        );
        assert!(!report.authenticated());
        assert_eq!(report.status(), CredentialStatus::Failed);
        assert_eq!(report.passed_count(), 2);
    }

    #[test]
    fn test_environment_resolution_verdicts() {
        let attempt = |environment, profile: Option<ProbeOutcome>| EnvironmentAttempt {
            environment,
            public: success(),
            profile,
        };

        let resolved = EnvironmentResolution::from_attempts(vec![
            attempt(Environment::Production, Some(auth_failure())),
            attempt(Environment::Testnet, Some(success())),
        ]);
        assert_eq!(resolved.verdict(), &EnvironmentVerdict::Resolved(Environment::Testnet));

        let ambiguous = EnvironmentResolution::from_attempts(vec![
            attempt(Environment::Production, Some(success())),
            attempt(Environment::Testnet, Some(success())),
        ]);
        assert_eq!(
            ambiguous.verdict(),
            &EnvironmentVerdict::Ambiguous(vec![Environment::Production, Environment::Testnet])
        );
        assert_eq!(ambiguous.resolved(), None);

        let none = EnvironmentResolution::from_attempts(vec![
            attempt(Environment::Production, None),
            attempt(Environment::Testnet, Some(auth_failure())),
        ]);
        assert_eq!(none.verdict(), &EnvironmentVerdict::NoMatch);
        assert!(none.attempts()[0].was_skipped());
        assert!(none.matched().is_empty());
    }

    #[test]
    fn test_environment_mismatch_flag() {
        let resolution = EnvironmentResolution::from_attempts(vec![
            EnvironmentAttempt {
                environment: Environment::Production,
                public: success(),
                profile: Some(auth_failure()),
            },
            EnvironmentAttempt {
                environment: Environment::Testnet,
                public: success(),
                profile: Some(success()),
            },
        ]);

        let report = CredentialReport::from_stages(
            Environment::Production,
            vec![StageRecord {
                stage: Stage::EnvironmentCheck,
                outcome: StageOutcome::Environment(resolution),
            }],
        );
        assert_eq!(report.environment_mismatch(), Some(Environment::Testnet));
    }

    #[test]
    fn test_fleet_counts_and_rate() {
        let working = CredentialReport::from_stages(
            Environment::Production,
            vec![probe(Stage::Authentication, success())],
        );
        let failed = CredentialReport::from_stages(
            Environment::Production,
            vec![probe(Stage::Authentication, auth_failure())],
        );

        let report = FleetReport::new(
            vec![
                entry("alpha", CredentialKind::Broker, working),
                entry("beta", CredentialKind::Follower, failed),
                entry(
                    "gamma",
                    CredentialKind::Follower,
                    CredentialReport::no_credentials(Environment::Production),
                ),
            ],
            false,
        );

        assert_eq!(report.working_count(), 1);
        assert_eq!(report.total_count(), 3);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.no_credentials_count(), 1);
        assert_eq!(report.success_rate_pct(), 33.3);
        assert_eq!(report.health(), FleetHealth::Partial);
        assert_eq!(
            report.counts_by_kind(CredentialKind::Follower),
            KindCounts {
                working: 0,
                total: 2
            }
        );
    }

    #[test]
    fn test_fleet_json_carries_rate_health_and_status() {
        let working = CredentialReport::from_stages(
            Environment::Production,
            vec![probe(Stage::Authentication, success())],
        );
        let failed = CredentialReport::from_stages(
            Environment::Production,
            vec![probe(Stage::Authentication, auth_failure())],
        );
        let report = FleetReport::new(
            vec![
                entry("alpha", CredentialKind::Broker, working),
                entry("beta", CredentialKind::Follower, failed),
                entry(
                    "gamma",
                    CredentialKind::Follower,
                    CredentialReport::no_credentials(Environment::Production),
                ),
            ],
            false,
        );

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success_rate"], 33.3);
        assert_eq!(value["health"], "partial");
        assert_eq!(value["working_count"], 1);
        assert_eq!(value["total_count"], 3);
        assert_eq!(value["interrupted"], false);
        assert_eq!(value["entries"][0]["status"], "WORKING");
        assert_eq!(value["entries"][1]["status"], "FAILED");
        assert_eq!(value["entries"][2]["status"], "NO_CREDENTIALS");
        assert_eq!(value["entries"][1]["identifier"], "beta");
        assert_eq!(value["entries"][1]["kind"], "follower");
    }

    #[test]
    fn test_empty_fleet_rate_is_zero() {
        let report = FleetReport::new(Vec::new(), false);
        assert_eq!(report.success_rate(), 0.0);
        assert!(!report.success_rate().is_nan());
        assert_eq!(report.health(), FleetHealth::Empty);
    }
}
