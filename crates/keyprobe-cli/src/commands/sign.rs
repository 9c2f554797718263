//! 서명 계산 도우미.

use anyhow::{bail, Result};
use keyprobe_exchange::{canonical_message, sign};

/// 서명 계산 설정.
#[derive(Debug)]
pub struct SignConfig {
    /// API 시크릿
    pub secret: String,
    /// 서명할 메시지 (지정 시 아래 요청 필드는 무시)
    pub message: Option<String>,
    /// HTTP 메서드
    pub method: String,
    /// 요청 경로
    pub path: Option<String>,
    /// 쿼리 문자열 (`?` 포함)
    pub query: String,
    /// 요청 본문
    pub body: String,
    /// Unix 타임스탬프 (초, 없으면 현재 시각)
    pub timestamp: Option<i64>,
}

/// 서명 대상 메시지를 구성합니다.
pub fn build_message(config: &SignConfig) -> Result<String> {
    if let Some(message) = &config.message {
        return Ok(message.clone());
    }

    let Some(path) = &config.path else {
        bail!("Either --message or --path is required");
    };
    let timestamp = config
        .timestamp
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    Ok(canonical_message(
        &config.method.to_uppercase(),
        &timestamp.to_string(),
        path,
        &config.query,
        &config.body,
    ))
}

/// 메시지와 서명을 출력합니다. 시크릿은 출력하지 않습니다.
pub fn run_sign(config: SignConfig) -> Result<String> {
    let message = build_message(&config)?;
    let signature = sign(&config.secret, &message);

    println!("message:   {}", message);
    println!("signature: {}", signature);
    Ok(signature)
}
