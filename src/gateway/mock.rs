//! Scripted in-memory transport for unit tests.

use async_trait::async_trait;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::gateway::transport::Transport;
use crate::gateway::types::{GatewayError, GatewayRequest, GatewayResponse, GatewayResult};

/// What the mock does for one request.
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(u16, String),
    NetworkError(String),
    /// Never completes; only a timeout gets the caller out.
    Hang,
    /// Wait, then behave like the inner reply.
    Delay(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        MockReply::Respond(status, body.to_string())
    }

    pub fn status(status: u16) -> Self {
        MockReply::Respond(status, String::new())
    }
}

type Handler = Arc<dyn Fn(&GatewayRequest) -> MockReply + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub token: Option<String>,
    pub body: Option<serde_json::Value>,
    pub at: Instant,
}

/// Routes requests by method and path. Unrouted requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Handler>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(&GatewayRequest) -> MockReply + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Arc::new(handler));
    }

    pub fn reply(&self, method: Method, path: &str, reply: MockReply) {
        self.on(method, path, move |_| reply.clone());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.path == path).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &GatewayRequest, _request_id: &str) -> GatewayResult<GatewayResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.clone(),
            path: request.path.clone(),
            token: request.token.clone(),
            body: request.body.clone(),
            at: Instant::now(),
        });

        let handler = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method.clone(), request.path.clone()))
            .cloned();

        let mut reply = match handler {
            Some(handler) => (*handler)(request),
            None => MockReply::status(404),
        };

        loop {
            match reply {
                MockReply::Respond(status, body) => return Ok(GatewayResponse::new(status, body)),
                MockReply::NetworkError(e) => return Err(GatewayError::Network(e)),
                MockReply::Hang => return std::future::pending().await,
                MockReply::Delay(d, inner) => {
                    tokio::time::sleep(d).await;
                    reply = *inner;
                }
            }
        }
    }
}

/// Gateway over `transport` with no retries and no breaker, for tests that
/// exercise the layers above the gateway.
pub fn plain_gateway(transport: Arc<MockTransport>) -> Arc<crate::gateway::ResilientGateway> {
    Arc::new(crate::gateway::ResilientGateway::new(
        transport,
        crate::resilience::RetryPolicy::new(0, 1000, 30_000, false),
        None,
        Duration::from_secs(10),
    ))
}
