//! API 자격증명 진단 CLI.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 자격증명 제공자 (PostgreSQL, TOML 파일, 환경변수)
//! - 결과 출력 (콘솔 표, JSON)
//! - 진단/환경 판별/서명 명령

pub mod commands;
pub mod sink;
pub mod source;
