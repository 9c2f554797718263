//! 진단 결과로부터 운영자 조치 사항 도출.

use serde::Serialize;
use std::fmt;

use super::{CredentialReport, CredentialStatus, Environment, ProbeOutcome, Stage, StageOutcome};

/// API 키 관리 페이지.
pub const API_KEY_MANAGEMENT_URL: &str = "https://www.delta.exchange/app/account/manageapikeys";

/// 운영자 조치 사항.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Recommendation {
    /// 키 또는 시크릿 누락
    MissingCredentials,
    /// 공개 엔드포인트 연결 실패
    NetworkConnectivity,
    /// 서명 구현 불일치
    SignatureImplementation,
    /// 키가 다른 환경용으로 발급됨
    EnvironmentMismatch {
        declared: Environment,
        working: Environment,
    },
    /// 어떤 환경에서도 키가 동작하지 않음
    NoEnvironmentAccepts,
    /// IP 화이트리스트 미등록
    IpNotWhitelisted { public_ip: Option<String> },
    /// 인증 실패
    AuthenticationFailed,
    /// 거래 권한 없음
    TradingPermissions,
    /// 모든 단계 통과
    AllClear,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::MissingCredentials => {
                f.write_str("API 키/시크릿이 설정되지 않았습니다. 자격증명을 등록하세요.")
            }
            Recommendation::NetworkConnectivity => {
                f.write_str("네트워크 연결 문제입니다. 인터넷 연결과 거래소 URL을 확인하세요.")
            }
            Recommendation::SignatureImplementation => {
                f.write_str("서명 생성 문제입니다. HMAC 구현을 확인하세요.")
            }
            Recommendation::EnvironmentMismatch { declared, working } => write!(
                f,
                "환경 불일치: 키는 {}에서 동작하지만 {}에 연결 중입니다.",
                working, declared
            ),
            Recommendation::NoEnvironmentAccepts => f.write_str(
                "어떤 환경에서도 키가 동작하지 않습니다. 해당 환경에서 발급한 키인지 확인하세요.",
            ),
            Recommendation::IpNotWhitelisted { public_ip } => match public_ip {
                Some(ip) => write!(
                    f,
                    "IP {}가 화이트리스트에 없습니다. {} 에서 추가하세요.",
                    ip, API_KEY_MANAGEMENT_URL
                ),
                None => write!(
                    f,
                    "IP가 화이트리스트에 없습니다. {} 에서 추가하세요.",
                    API_KEY_MANAGEMENT_URL
                ),
            },
            Recommendation::AuthenticationFailed => f.write_str(
                "인증 실패: API 키/시크릿, 환경, 시스템 시간 동기화를 확인하세요.",
            ),
            Recommendation::TradingPermissions => {
                f.write_str("거래 권한 문제입니다. API 키에 거래 권한이 있는지 확인하세요.")
            }
            Recommendation::AllClear => f.write_str("모든 점검을 통과했습니다."),
        }
    }
}

impl CredentialReport {
    /// 단계 결과로부터 조치 사항 목록을 도출합니다.
    pub fn recommendations(&self) -> Vec<Recommendation> {
        if self.status() == CredentialStatus::NoCredentials {
            return vec![Recommendation::MissingCredentials];
        }

        let mut recommendations = Vec::new();

        for record in self.stages() {
            if record.outcome.passed() {
                continue;
            }

            match (&record.stage, &record.outcome) {
                (Stage::PublicEndpoint, _) => {
                    recommendations.push(Recommendation::NetworkConnectivity)
                }
                (Stage::SignatureSelfCheck, _) => {
                    recommendations.push(Recommendation::SignatureImplementation)
                }
                (Stage::EnvironmentCheck, _) => {
                    recommendations.push(Recommendation::NoEnvironmentAccepts)
                }
                (Stage::IpWhitelist, StageOutcome::Probe(ProbeOutcome::NotWhitelisted { public_ip })) => {
                    recommendations.push(Recommendation::IpNotWhitelisted {
                        public_ip: public_ip.clone(),
                    })
                }
                (Stage::IpWhitelist, _) => {}
                (Stage::Authentication, _) => {
                    recommendations.push(Recommendation::AuthenticationFailed)
                }
                (Stage::TradingPermissions, _) => {
                    recommendations.push(Recommendation::TradingPermissions)
                }
            }
        }

        if let Some(working) = self.environment_mismatch() {
            recommendations.push(Recommendation::EnvironmentMismatch {
                declared: self.declared_environment(),
                working,
            });
        }

        if recommendations.is_empty() {
            recommendations.push(Recommendation::AllClear);
        }

        recommendations
    }
}
