//! Top-level wiring.
//!
//! `LocationClient` assembles one gateway and one session manager from a
//! `ClientConfig` and hands the same instances to the resource client and
//! the aggregation engine.

use std::sync::Arc;

use crate::aggregation::AggregationEngine;
use crate::api::ResourceClient;
use crate::config::ClientConfig;
use crate::gateway::{GatewayResult, ResilientGateway, Transport};
use crate::observability::metrics;
use crate::session::{FileTokenStore, SessionManager, TokenStore};

#[derive(Debug, Clone)]
pub struct LocationClient {
    gateway: Arc<ResilientGateway>,
    session: Arc<SessionManager>,
    resources: ResourceClient,
    aggregation: AggregationEngine,
}

impl LocationClient {
    /// HTTP transport and a file token store at `config.token_store.path`.
    pub fn from_config(config: &ClientConfig) -> GatewayResult<Self> {
        let gateway = Arc::new(ResilientGateway::from_config(config)?);
        let store = Arc::new(FileTokenStore::new(&config.token_store.path));
        Ok(Self::assemble(gateway, store, config))
    }

    /// Custom transport and token store, policies from `config`.
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
        config: &ClientConfig,
    ) -> Self {
        let gateway = Arc::new(ResilientGateway::with_transport(transport, config));
        Self::assemble(gateway, store, config)
    }

    fn assemble(gateway: Arc<ResilientGateway>, store: Arc<dyn TokenStore>, config: &ClientConfig) -> Self {
        metrics::set_enabled(config.observability.metrics_enabled);

        let session = Arc::new(SessionManager::new(gateway.clone(), store));
        let resources = ResourceClient::new(gateway.clone(), session.clone());
        let aggregation = AggregationEngine::from_config(resources.clone(), &config.aggregation);

        Self {
            gateway,
            session,
            resources,
            aggregation,
        }
    }

    pub fn gateway(&self) -> &Arc<ResilientGateway> {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn resources(&self) -> &ResourceClient {
        &self.resources
    }

    pub fn aggregation(&self) -> &AggregationEngine {
        &self.aggregation
    }
}
