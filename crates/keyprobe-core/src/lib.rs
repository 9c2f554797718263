//! # Keyprobe Core
//!
//! 거래소 API 자격증명 진단 도구의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 진단 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - 자격증명 및 계정 유형
//! - 네트워크 환경 (운영/테스트넷) 정의
//! - 프로브 결과 및 자격증명/플릿 리포트
//! - 외부 협력자 계약 (`CredentialSource`, `ReportSink`)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod traits;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
