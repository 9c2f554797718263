//! 환경 판별 통합 테스트.

mod common;

use keyprobe_core::{Credential, Environment, EnvironmentVerdict};
use keyprobe_exchange::EnvironmentResolver;
use mockito::{Matcher, ServerGuard};

use common::*;

fn credential() -> Credential {
    Credential::new("testnet-only", "tn-api-key-000001", "tn-secret")
}

/// 공개 엔드포인트는 정상이고 프로필 응답만 지정한 백엔드.
async fn backend(profile_status: usize, profile_body: &str) -> ServerGuard {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/products")
        .with_status(200)
        .with_body(PRODUCTS_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/profile")
        .with_status(profile_status)
        .with_body(profile_body)
        .create_async()
        .await;
    server
}

#[tokio::test]
async fn test_testnet_only_credential_resolves_to_testnet() {
    let production = backend(401, INVALID_KEY_BODY).await;
    let testnet = backend(200, PROFILE_BODY).await;

    let client = client(&production.url(), &testnet.url(), &testnet.url());
    let resolution = EnvironmentResolver::new(client).resolve(&credential()).await;

    assert_eq!(resolution.matched(), vec![Environment::Testnet]);
    assert_eq!(resolution.resolved(), Some(Environment::Testnet));
    assert_eq!(
        resolution.verdict(),
        &EnvironmentVerdict::Resolved(Environment::Testnet)
    );
    assert_eq!(resolution.attempts().len(), 2);
}

#[tokio::test]
async fn test_both_environments_accepting_is_ambiguous() {
    let production = backend(200, PROFILE_BODY).await;
    let testnet = backend(200, PROFILE_BODY).await;

    let client = client(&production.url(), &testnet.url(), &testnet.url());
    let resolution = EnvironmentResolver::new(client).resolve(&credential()).await;

    assert_eq!(
        resolution.matched(),
        vec![Environment::Production, Environment::Testnet]
    );
    assert_eq!(resolution.resolved(), None);
    assert_eq!(
        resolution.verdict(),
        &EnvironmentVerdict::Ambiguous(vec![Environment::Production, Environment::Testnet])
    );
}

#[tokio::test]
async fn test_no_environment_accepting_is_no_match() {
    let production = backend(401, INVALID_KEY_BODY).await;
    let testnet = backend(401, INVALID_KEY_BODY).await;

    let client = client(&production.url(), &testnet.url(), &testnet.url());
    let resolution = EnvironmentResolver::new(client).resolve(&credential()).await;

    assert!(resolution.matched().is_empty());
    assert_eq!(resolution.verdict(), &EnvironmentVerdict::NoMatch);
}

#[tokio::test]
async fn test_environment_with_failing_public_endpoint_is_skipped() {
    let mut production = mockito::Server::new_async().await;
    production
        .mock("GET", "/v2/products")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;
    let untouched_profile = production
        .mock("GET", Matcher::Regex(r"^/v2/profile".to_string()))
        .expect(0)
        .create_async()
        .await;
    let testnet = backend(200, PROFILE_BODY).await;

    let client = client(&production.url(), &testnet.url(), &testnet.url());
    let resolution = EnvironmentResolver::new(client).resolve(&credential()).await;

    let production_attempt = &resolution.attempts()[0];
    assert_eq!(production_attempt.environment, Environment::Production);
    assert!(production_attempt.was_skipped());
    assert_eq!(resolution.resolved(), Some(Environment::Testnet));
    untouched_profile.assert_async().await;
}
