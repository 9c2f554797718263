//! 단계별 진단 통합 테스트.

mod common;

use keyprobe_core::{
    Credential, CredentialStatus, Environment, NetworkCause, ProbeOutcome, Recommendation, Stage,
    StageOutcome,
};
use keyprobe_exchange::DiagnosticRunner;

use common::*;

fn credential() -> Credential {
    Credential::new("alpha", "alpha-api-key-0001", "alpha-secret")
}

#[tokio::test]
async fn test_all_stages_run_when_backend_is_down() {
    let url = closed_port_url().await;
    let runner = DiagnosticRunner::new(client(&url, &url, &url), Environment::Production)
        .with_extra_stages(&[Stage::EnvironmentCheck]);

    let report = runner.run(&credential()).await;

    let stages: Vec<Stage> = report.stages().iter().map(|record| record.stage).collect();
    assert_eq!(stages, Stage::ORDERED.to_vec());
    assert!(!report.authenticated());
    assert_eq!(report.status(), CredentialStatus::Failed);

    // 서명 자체 검증은 네트워크와 무관하게 통과
    assert_eq!(
        report.outcome(Stage::SignatureSelfCheck),
        Some(&StageOutcome::SelfCheck { passed: true })
    );
    assert!(matches!(
        report.probe_outcome(Stage::Authentication),
        Some(ProbeOutcome::NetworkError {
            cause: NetworkCause::Connect(_)
        })
    ));
    assert!(report
        .recommendations()
        .contains(&Recommendation::NetworkConnectivity));
}

#[tokio::test]
async fn test_ip_block_reports_detected_ip_on_every_signed_stage() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/products")
        .with_status(200)
        .with_body(PRODUCTS_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/ip")
        .with_status(200)
        .with_body("203.0.113.7")
        .create_async()
        .await;
    server
        .mock("GET", "/v2/profile")
        .with_status(401)
        .with_body(IP_BLOCKED_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/wallet/balances")
        .with_status(401)
        .with_body(IP_BLOCKED_BODY)
        .create_async()
        .await;
    let orders = server
        .mock("GET", mockito::Matcher::Regex(r"^/v2/orders".to_string()))
        .with_status(401)
        .with_body(IP_BLOCKED_BODY)
        .expect(1)
        .create_async()
        .await;

    let ip_url = format!("{}/ip", server.url());
    let runner = DiagnosticRunner::new(
        client(&server.url(), &server.url(), &ip_url),
        Environment::Production,
    );
    let report = runner.run(&credential()).await;

    assert_eq!(
        report.probe_outcome(Stage::IpWhitelist),
        Some(&ProbeOutcome::NotWhitelisted {
            public_ip: Some("203.0.113.7".to_string())
        })
    );
    assert_eq!(
        report.probe_outcome(Stage::Authentication),
        Some(&ProbeOutcome::NotWhitelisted {
            public_ip: Some("203.0.113.7".to_string())
        })
    );
    assert_eq!(
        report.probe_outcome(Stage::TradingPermissions),
        Some(&ProbeOutcome::NotWhitelisted {
            public_ip: Some("203.0.113.7".to_string())
        })
    );
    assert!(report.recommendations().contains(&Recommendation::IpNotWhitelisted {
        public_ip: Some("203.0.113.7".to_string())
    }));
    orders.assert_async().await;
}

#[tokio::test]
async fn test_testnet_key_declared_production_reports_mismatch() {
    let mut production = mockito::Server::new_async().await;
    production
        .mock("GET", "/v2/products")
        .with_status(200)
        .with_body(PRODUCTS_BODY)
        .create_async()
        .await;
    for path in ["/v2/profile", "/v2/wallet/balances"] {
        production
            .mock("GET", path)
            .with_status(401)
            .with_body(INVALID_KEY_BODY)
            .create_async()
            .await;
    }
    production
        .mock("GET", mockito::Matcher::Regex(r"^/v2/orders".to_string()))
        .with_status(401)
        .with_body(INVALID_KEY_BODY)
        .create_async()
        .await;

    let mut testnet = mockito::Server::new_async().await;
    testnet
        .mock("GET", "/v2/products")
        .with_status(200)
        .with_body(PRODUCTS_BODY)
        .create_async()
        .await;
    testnet
        .mock("GET", "/v2/profile")
        .with_status(200)
        .with_body(PROFILE_BODY)
        .create_async()
        .await;
    testnet
        .mock("GET", "/ip")
        .with_status(200)
        .with_body("198.51.100.1")
        .create_async()
        .await;

    let ip_url = format!("{}/ip", testnet.url());
    let runner = DiagnosticRunner::new(
        client(&production.url(), &testnet.url(), &ip_url),
        Environment::Production,
    )
    .with_extra_stages(&[Stage::EnvironmentCheck]);

    let report = runner.run(&credential()).await;

    assert!(!report.authenticated());
    assert_eq!(report.environment_mismatch(), Some(Environment::Testnet));
    assert!(report
        .recommendations()
        .contains(&Recommendation::EnvironmentMismatch {
            declared: Environment::Production,
            working: Environment::Testnet,
        }));
}
