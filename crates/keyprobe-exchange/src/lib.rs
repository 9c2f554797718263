//! 거래소 API 자격증명 진단 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - HMAC-SHA256 요청 서명 (`signer`)
//! - 인증 헤더 구성 (`composer`)
//! - 진단 엔드포인트 호출 및 응답 분류 (`probe`, `client`)
//! - 자격증명이 속한 네트워크 환경 판별 (`resolver`)
//! - 자격증명 하나에 대한 단계별 진단 (`runner`)
//! - 플릿 전체 진단 및 집계 (`fleet`)

pub mod client;
pub mod composer;
pub mod error;
pub mod fleet;
pub mod probe;
pub mod resolver;
pub mod runner;
pub mod signer;

pub use client::{ProbeClient, ProbeClientConfig};
pub use composer::{AuthHeaders, RequestComposer};
pub use error::*;
pub use fleet::FleetAggregator;
pub use probe::{classify_response, ProbeSpec};
pub use resolver::EnvironmentResolver;
pub use runner::DiagnosticRunner;
pub use signer::{canonical_message, sign, signature_self_check};
