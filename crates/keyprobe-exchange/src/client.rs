//! 진단 엔드포인트 HTTP 클라이언트.
//!
//! 모든 호출은 단 한 번만 시도하며 제한 시간으로 묶입니다. 재시도하지 않습니다.

use std::fmt;
use std::time::Duration;

use keyprobe_core::{
    Credential, Environment, EnvironmentEndpoints, ExchangeSettings, NetworkCause, ProbeOutcome,
};
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::Client;
use tracing::{debug, warn};

use crate::composer::RequestComposer;
use crate::error::{network_cause, ProbeError};
use crate::probe::{classify_response, ProbeSpec};

// ============================================================================
// 설정
// ============================================================================

/// 프로브 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct ProbeClientConfig {
    /// 환경별 REST 기본 URL
    pub endpoints: EnvironmentEndpoints,
    /// 요청 User-Agent
    pub user_agent: String,
    /// 진단 요청 타임아웃
    pub request_timeout: Duration,
    /// 환경 판별 요청 타임아웃
    pub environment_probe_timeout: Duration,
    /// 공인 IP 조회 서비스 URL
    pub ip_lookup_url: String,
    /// 공인 IP 조회 타임아웃
    pub ip_lookup_timeout: Duration,
}

impl Default for ProbeClientConfig {
    fn default() -> Self {
        Self::from_settings(&ExchangeSettings::default())
    }
}

impl ProbeClientConfig {
    /// 애플리케이션 설정에서 생성.
    pub fn from_settings(settings: &ExchangeSettings) -> Self {
        Self {
            endpoints: settings.endpoints(),
            user_agent: settings.user_agent.clone(),
            request_timeout: settings.request_timeout(),
            environment_probe_timeout: settings.environment_probe_timeout(),
            ip_lookup_url: settings.ip_lookup_url.clone(),
            ip_lookup_timeout: settings.ip_lookup_timeout(),
        }
    }

    /// 환경별 URL 지정.
    pub fn with_endpoints(mut self, endpoints: EnvironmentEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// 모든 요청 타임아웃을 같은 값으로 지정.
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self.environment_probe_timeout = timeout;
        self.ip_lookup_timeout = timeout;
        self
    }

    /// 공인 IP 조회 URL 지정.
    pub fn with_ip_lookup_url(mut self, url: impl Into<String>) -> Self {
        self.ip_lookup_url = url.into();
        self
    }
}

// ============================================================================
// 클라이언트
// ============================================================================

/// 진단 엔드포인트 호출기.
pub struct ProbeClient {
    config: ProbeClientConfig,
    http: Client,
}

impl fmt::Debug for ProbeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeClient")
            .field("config", &self.config)
            .finish()
    }
}

impl ProbeClient {
    /// 새 프로브 클라이언트 생성.
    ///
    /// # Errors
    /// User-Agent가 헤더 값으로 유효하지 않거나 HTTP 클라이언트 생성에 실패하면 에러를 반환합니다.
    pub fn new(config: ProbeClientConfig) -> Result<Self, ProbeError> {
        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|e| ProbeError::InvalidHeader {
                name: "User-Agent",
                reason: e.to_string(),
            })?;

        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(USER_AGENT, user_agent);

        let http = Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| ProbeError::Client(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { config, http })
    }

    /// 환경의 REST 기본 URL.
    pub fn base_url(&self, environment: Environment) -> &str {
        self.config.endpoints.base_url(environment)
    }

    /// 진단 요청 타임아웃으로 엔드포인트를 한 번 호출합니다.
    pub async fn probe(
        &self,
        environment: Environment,
        credential: &Credential,
        spec: ProbeSpec,
    ) -> ProbeOutcome {
        self.execute(environment, credential, spec, self.config.request_timeout, None)
            .await
    }

    /// 감지된 공인 IP를 IP 차단 결과에 포함하여 호출합니다.
    pub async fn probe_with_public_ip(
        &self,
        environment: Environment,
        credential: &Credential,
        spec: ProbeSpec,
        public_ip: Option<&str>,
    ) -> ProbeOutcome {
        self.execute(
            environment,
            credential,
            spec,
            self.config.request_timeout,
            public_ip,
        )
        .await
    }

    /// 환경 판별용 타임아웃으로 호출합니다.
    pub async fn probe_environment(
        &self,
        environment: Environment,
        credential: &Credential,
        spec: ProbeSpec,
    ) -> ProbeOutcome {
        self.execute(
            environment,
            credential,
            spec,
            self.config.environment_probe_timeout,
            None,
        )
        .await
    }

    /// 외부 IP 에코 서비스로 공인 IP를 조회합니다.
    pub async fn public_ip(&self) -> Result<String, NetworkCause> {
        debug!("GET {}", self.config.ip_lookup_url);

        let response = self
            .http
            .get(&self.config.ip_lookup_url)
            .timeout(self.config.ip_lookup_timeout)
            .send()
            .await
            .map_err(|e| network_cause(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| network_cause(&e))?;

        if !status.is_success() {
            return Err(NetworkCause::Other(format!(
                "IP lookup returned HTTP {}",
                status.as_u16()
            )));
        }

        let ip = body.trim().to_string();
        if ip.is_empty() {
            return Err(NetworkCause::Other("IP lookup returned empty body".to_string()));
        }
        Ok(ip)
    }

    /// 요청 구성, 전송, 분류.
    async fn execute(
        &self,
        environment: Environment,
        credential: &Credential,
        spec: ProbeSpec,
        timeout: Duration,
        public_ip: Option<&str>,
    ) -> ProbeOutcome {
        let path = spec.path();
        let query_string = spec.query_string();
        let url = format!("{}{}{}", self.base_url(environment), path, query_string);

        let mut request = self
            .http
            .request(spec.method(), &url)
            .timeout(timeout);

        if spec.requires_auth() {
            let headers =
                RequestComposer::build_headers(credential, &spec.method(), path, query_string, "");
            for (name, value) in headers.pairs() {
                request = request.header(name, value);
            }
            debug!(
                probe = spec.name(),
                %environment,
                key = %credential.masked_key(),
                timestamp = %headers.timestamp,
                "{} (signed) {}{}",
                spec.method(),
                path,
                query_string
            );
        } else {
            debug!(probe = spec.name(), %environment, "{} {}", spec.method(), url);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let cause = network_cause(&e);
                warn!(probe = spec.name(), %environment, %cause, "Probe transport failure");
                return ProbeOutcome::NetworkError { cause };
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let cause = network_cause(&e);
                warn!(probe = spec.name(), %environment, %cause, "Failed to read probe response");
                return ProbeOutcome::NetworkError { cause };
            }
        };

        let outcome = classify_response(status, &body, public_ip);
        debug!(
            probe = spec.name(),
            %environment,
            status,
            outcome = outcome.tag(),
            "Probe classified"
        );
        outcome
    }
}
