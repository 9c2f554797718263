//! 자격증명의 네트워크 환경 판별.

use anyhow::Result;
use keyprobe_core::{AppConfig, EnvironmentResolution, EnvironmentVerdict};
use keyprobe_exchange::EnvironmentResolver;

use super::{build_client, credential_from_args};

/// 환경 판별 설정.
#[derive(Debug)]
pub struct ResolveConfig {
    /// API 키 (없으면 `DELTA_API_KEY`)
    pub api_key: Option<String>,
    /// API 시크릿 (없으면 `DELTA_API_SECRET`)
    pub api_secret: Option<String>,
    /// JSON 출력
    pub json: bool,
}

/// 모든 환경에서 자격증명을 시도하고 결과를 출력합니다.
pub async fn run_resolve(app: &AppConfig, config: ResolveConfig) -> Result<EnvironmentResolution> {
    let credential = credential_from_args("cli", config.api_key, config.api_secret);
    if !credential.is_complete() {
        anyhow::bail!(
            "API key/secret not set. Use --api-key/--api-secret or DELTA_API_KEY/DELTA_API_SECRET"
        );
    }

    let resolver = EnvironmentResolver::new(build_client(app)?);
    let resolution = resolver.resolve(&credential).await;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(resolution);
    }

    println!("\n🌐 환경 판별");
    println!("API Key: {}", credential.masked_key());
    for attempt in resolution.attempts() {
        match &attempt.profile {
            Some(profile) => println!(
                "   {} {:<10} public: {} / profile: {}",
                if attempt.profile_succeeded() { "✅" } else { "❌" },
                attempt.environment.name(),
                attempt.public,
                profile
            ),
            None => println!(
                "   ⏭️  {:<10} public: {} (건너뜀)",
                attempt.environment.name(),
                attempt.public
            ),
        }
    }

    match resolution.verdict() {
        EnvironmentVerdict::Resolved(env) => {
            println!("\n✅ 이 키는 {} 환경용입니다.", env);
            if *env != app.exchange.declared_environment {
                println!(
                    "⚠️  설정된 환경({})과 다릅니다. 설정 또는 키를 확인하세요.",
                    app.exchange.declared_environment
                );
            }
        }
        EnvironmentVerdict::Ambiguous(envs) => {
            let names: Vec<&str> = envs.iter().map(|env| env.name()).collect();
            println!("\n⚠️  여러 환경에서 동작합니다: {}", names.join(", "));
        }
        EnvironmentVerdict::NoMatch => {
            println!("\n❌ 어떤 환경에서도 동작하지 않습니다.");
        }
    }

    Ok(resolution)
}
