//! 통합 테스트 공용 헬퍼.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use keyprobe_core::EnvironmentEndpoints;
use keyprobe_exchange::{ProbeClient, ProbeClientConfig};

pub const TEST_USER_AGENT: &str = "keyprobe-test";

pub const PRODUCTS_BODY: &str = r#"{"success":true,"result":[{"id":1,"symbol":"BTCUSD"},{"id":2,"symbol":"ETHUSD"}]}"#;
pub const WALLET_BODY: &str = r#"{"success":true,"result":[{"asset_symbol":"USD","balance":"100.0"}]}"#;
pub const ORDERS_BODY: &str = r#"{"success":true,"result":[]}"#;
pub const PROFILE_BODY: &str = r#"{"success":true,"result":{"id":42,"email":"ops@example.com"}}"#;
pub const INVALID_KEY_BODY: &str = r#"{"error":{"code":"InvalidApiKey"},"success":false}"#;
pub const IP_BLOCKED_BODY: &str =
    r#"{"error":{"code":"ip_blocked_for_api_key","context":{"client_ip":"203.0.113.7"}},"success":false}"#;

/// 두 환경과 IP 조회 URL을 지정한 클라이언트.
pub fn client(production: &str, testnet: &str, ip_lookup_url: &str) -> Arc<ProbeClient> {
    client_with_timeout(production, testnet, ip_lookup_url, Duration::from_secs(5))
}

pub fn client_with_timeout(
    production: &str,
    testnet: &str,
    ip_lookup_url: &str,
    timeout: Duration,
) -> Arc<ProbeClient> {
    let config = ProbeClientConfig {
        user_agent: TEST_USER_AGENT.to_string(),
        ..Default::default()
    }
    .with_endpoints(EnvironmentEndpoints::new(production, testnet))
    .with_timeouts(timeout)
    .with_ip_lookup_url(ip_lookup_url);

    Arc::new(ProbeClient::new(config).expect("test client"))
}

/// 연결은 받지만 응답하지 않는 서버.
pub async fn silent_server() -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent listener");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    (format!("http://{}", addr), handle)
}

/// 아무것도 수신하지 않는 주소.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind temp listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}
