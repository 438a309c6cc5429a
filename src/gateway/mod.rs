//! Resilient gateway: the only component that talks to the network.
//!
//! # Data Flow
//! ```text
//! GatewayRequest
//!     → CircuitBreaker::try_acquire (Open → CircuitOpen, no attempt)
//!     → RetryPolicy::run
//!         → with_timeout(request_timeout, Transport::send)
//!         → transient (network, timeout, 408, 5xx)? back off and retry
//!     → Permit::success / Permit::failure on the final outcome
//!     → GatewayResponse (any status) or GatewayError
//! ```
//!
//! # Design Decisions
//! - One breaker per gateway instance, shared by every clone of the `Arc`
//! - Exhausted retries on a transient status still return the last response;
//!   callers decide what a status means
//! - Each logical call carries a UUID request id (x-request-id)

pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::observability::metrics;
use crate::resilience::{
    is_transient_status, with_timeout, CircuitBreaker, CircuitState, RetryCause, RetryPolicy,
};

pub use transport::{HttpTransport, Transport};
pub use types::{GatewayError, GatewayRequest, GatewayResponse, GatewayResult};

/// Retry + circuit breaker + timeout around a `Transport`.
pub struct ResilientGateway {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    breaker: Option<CircuitBreaker>,
    request_timeout: Duration,
}

impl ResilientGateway {
    /// Compose the policies explicitly.
    pub fn new(
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
        breaker: Option<CircuitBreaker>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            retry,
            breaker,
            request_timeout,
        }
    }

    /// Build policies from configuration around the given transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        let breaker = config
            .circuit_breaker
            .enabled
            .then(|| CircuitBreaker::from_config(&config.circuit_breaker));

        Self::new(
            transport,
            RetryPolicy::from_config(&config.retries),
            breaker,
            config.api.request_timeout(),
        )
    }

    /// Build a gateway that talks HTTP to `config.api.base_url`.
    pub fn from_config(config: &ClientConfig) -> GatewayResult<Self> {
        let transport = HttpTransport::new(&config.api)?;
        tracing::debug!(base_url = %transport.base_url(), "HTTP transport ready");
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Breaker state, `Closed` when the breaker is disabled.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker
            .as_ref()
            .map_or(CircuitState::Closed, CircuitBreaker::state)
    }

    /// Execute one logical request through breaker, retries and timeout.
    pub async fn execute(&self, request: GatewayRequest) -> GatewayResult<GatewayResponse> {
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let permit = match &self.breaker {
            Some(breaker) => match breaker.try_acquire() {
                Ok(permit) => Some(permit),
                Err(open) => {
                    tracing::warn!(
                        request_id = %request_id,
                        method = %request.method,
                        path = %request.path,
                        retry_after = ?open.retry_after,
                        "Circuit open, failing fast"
                    );
                    metrics::record_request(request.method.as_str(), "circuit_open");
                    return Err(GatewayError::CircuitOpen(open.retry_after));
                }
            },
            None => None,
        };

        let req = &request;
        let id = request_id.as_str();
        let outcome = self
            .retry
            .run(
                move |attempt| async move {
                    tracing::debug!(
                        request_id = %id,
                        attempt = attempt,
                        method = %req.method,
                        path = %req.path,
                        "Sending request"
                    );
                    match with_timeout(self.request_timeout, self.transport.send(req, id)).await {
                        Ok(result) => result,
                        Err(elapsed) => Err(GatewayError::Timeout(elapsed.0)),
                    }
                },
                classify,
            )
            .await;

        if let Some(permit) = permit {
            match &outcome {
                // Never reached the backend, so it says nothing about its health
                Err(GatewayError::InvalidRequest(_)) => permit.release(),
                _ if classify(&outcome).is_some() => permit.failure(),
                _ => permit.success(),
            }
        }

        match &outcome {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    status = response.status,
                    elapsed = ?start.elapsed(),
                    "Request completed"
                );
                metrics::record_request(request.method.as_str(), &response.status.to_string());
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    path = %request.path,
                    error = %e,
                    "Request failed"
                );
                metrics::record_request(request.method.as_str(), "error");
            }
        }

        outcome
    }
}

impl std::fmt::Debug for ResilientGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientGateway")
            .field("retry", &self.retry)
            .field("breaker", &self.breaker)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Which outcomes count as transient: for retrying and for the breaker.
fn classify(outcome: &GatewayResult<GatewayResponse>) -> Option<RetryCause> {
    match outcome {
        Ok(response) if is_transient_status(response.status) => Some(RetryCause::Status(response.status)),
        Ok(_) => None,
        Err(GatewayError::Timeout(_)) => Some(RetryCause::Timeout),
        Err(GatewayError::Network(e)) => Some(RetryCause::Network(e.clone())),
        Err(_) => None,
    }
}
