use std::sync::Arc;

use crate::{
    backend::UpstreamTransport, config::BridgeConfig, metrics::BridgeMetrics, router::PathRouter,
};

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<PathRouter>,
    pub metrics: Arc<BridgeMetrics>,
}

impl AppState {
    pub fn new<T>(config: &BridgeConfig, transport: Arc<T>) -> Self
    where
        T: UpstreamTransport + 'static,
    {
        let transport: Arc<dyn UpstreamTransport> = transport;
        Self {
            router: Arc::new(PathRouter::new(
                config.backend.clone(),
                config.dialect,
                transport,
            )),
            metrics: Arc::new(BridgeMetrics::new()),
        }
    }
}
