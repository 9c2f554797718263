//! 진단 엔드포인트 정의 및 응답 분류.

use keyprobe_core::{PayloadSummary, ProbeOutcome};
use reqwest::Method;
use serde::Deserialize;

/// IP 차단을 나타내는 응답 본문 표식 (소문자 비교).
const IP_BLOCK_MARKERS: [&str; 2] = ["ip_blocked", "ip_not_whitelisted"];

/// 잘못된 키/서명을 나타내는 응답 본문 표식 (소문자 비교).
const AUTH_FAILURE_MARKERS: [&str; 9] = [
    "invalidapikey",
    "invalid_api_key",
    "signaturemismatch",
    "signature_mismatch",
    "signature mismatch",
    "signatureexpired",
    "signature_expired",
    "expired_signature",
    "unauthorizedapiaccess",
];

/// 인증 실패 상세에 남길 본문 최대 길이.
const MAX_DETAIL_LEN: usize = 200;

/// 진단에 사용하는 고정 엔드포인트 집합.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeSpec {
    /// `GET /v2/products` (인증 불필요)
    PublicProducts,
    /// `GET /v2/wallet/balances`
    WalletBalances,
    /// `GET /v2/orders?state=open`
    OpenOrders,
    /// `GET /v2/profile`
    Profile,
}

impl ProbeSpec {
    /// 프로브 이름.
    pub fn name(&self) -> &'static str {
        match self {
            ProbeSpec::PublicProducts => "public_products",
            ProbeSpec::WalletBalances => "wallet_balances",
            ProbeSpec::OpenOrders => "open_orders",
            ProbeSpec::Profile => "profile",
        }
    }

    /// HTTP 메서드.
    pub fn method(&self) -> Method {
        Method::GET
    }

    /// 요청 경로 (호스트 제외).
    pub fn path(&self) -> &'static str {
        match self {
            ProbeSpec::PublicProducts => "/v2/products",
            ProbeSpec::WalletBalances => "/v2/wallet/balances",
            ProbeSpec::OpenOrders => "/v2/orders",
            ProbeSpec::Profile => "/v2/profile",
        }
    }

    /// 쿼리 문자열 (선행 `?` 포함, 없으면 빈 문자열).
    pub fn query_string(&self) -> &'static str {
        match self {
            ProbeSpec::OpenOrders => "?state=open",
            _ => "",
        }
    }

    /// 인증 필요 여부.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, ProbeSpec::PublicProducts)
    }
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    #[serde(default)]
    result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Coded { code: String },
    Message(String),
}

/// HTTP 상태와 본문으로 프로브 결과를 분류합니다.
///
/// 분류 순서:
/// 1. 200 → `Success`
/// 2. 본문에 IP 차단 표식 → `NotWhitelisted`
/// 3. 본문에 잘못된 키/서명 표식 → `AuthFailure`
/// 4. 그 외 → `Inconclusive` (본문 원문 보존)
pub fn classify_response(status: u16, body: &str, public_ip: Option<&str>) -> ProbeOutcome {
    if status == 200 {
        return ProbeOutcome::Success(summarize(body));
    }

    let lowered = body.to_lowercase();

    if IP_BLOCK_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ProbeOutcome::NotWhitelisted {
            public_ip: public_ip.map(str::to_string),
        };
    }

    if AUTH_FAILURE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ProbeOutcome::AuthFailure {
            detail: error_detail(body),
        };
    }

    ProbeOutcome::Inconclusive {
        status,
        body: body.to_string(),
    }
}

/// 성공 응답의 `result` 배열 크기 요약.
fn summarize(body: &str) -> PayloadSummary {
    let result_count = serde_json::from_str::<ResultEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.result)
        .and_then(|result| result.as_array().map(Vec::len));

    PayloadSummary { result_count }
}

/// 에러 응답에서 거래소 에러 코드를 추출합니다. 형식이 다르면 본문 앞부분을 사용합니다.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody::Coded { code },
        }) => code,
        Ok(ErrorEnvelope {
            error: ErrorBody::Message(message),
        }) => message,
        Err(_) => body.chars().take(MAX_DETAIL_LEN).collect(),
    }
}
