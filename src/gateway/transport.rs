//! Transport seam: one HTTP exchange, no policies.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::ApiConfig;
use crate::gateway::types::{GatewayError, GatewayRequest, GatewayResponse, GatewayResult};

/// Performs exactly one request/response exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &GatewayRequest, request_id: &str) -> GatewayResult<GatewayResponse>;
}

/// `reqwest`-backed transport rooted at the API base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> GatewayResult<Self> {
        let base_url = normalize_base(&config.base_url)?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> GatewayResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::InvalidRequest(format!("path '{}': {}", path, e)))
    }
}

/// Parse the base URL and make sure it ends with '/', so joins append.
fn normalize_base(raw: &str) -> GatewayResult<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| GatewayError::InvalidRequest(format!("base URL '{}': {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &GatewayRequest, request_id: &str) -> GatewayResult<GatewayResponse> {
        let url = self.url_for(&request.path)?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header("x-request-id", request_id);

        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(GatewayResponse { status, body })
    }
}
