use std::time::Duration;

use prometheus::{
    opts, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct BridgeMetrics {
    registry: Registry,
    proxy_requests_total: IntCounterVec,
    proxy_request_duration_seconds: HistogramVec,
    inflight_requests: IntGauge,
    upstream_errors_total: IntCounterVec,
}

pub struct InflightGuard<'a> {
    metrics: &'a BridgeMetrics,
}

impl BridgeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let proxy_requests_total = IntCounterVec::new(
            opts!(
                "bridge_proxy_requests_total",
                "Total requests forwarded to the inference backend"
            ),
            &["endpoint", "method", "status"],
        )
        .expect("valid proxy_requests_total metric");

        let proxy_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "bridge_proxy_request_duration_seconds",
                "Time until backend response headers arrived, in seconds",
            ),
            &["endpoint", "method"],
        )
        .expect("valid proxy_request_duration_seconds metric");

        let inflight_requests = IntGauge::new(
            "bridge_inflight_requests",
            "Requests currently waiting on the backend",
        )
        .expect("valid inflight_requests metric");

        let upstream_errors_total = IntCounterVec::new(
            opts!(
                "bridge_upstream_errors_total",
                "Requests that failed before a backend response was available"
            ),
            &["kind"],
        )
        .expect("valid upstream_errors_total metric");

        registry
            .register(Box::new(proxy_requests_total.clone()))
            .expect("register proxy_requests_total");
        registry
            .register(Box::new(proxy_request_duration_seconds.clone()))
            .expect("register proxy_request_duration_seconds");
        registry
            .register(Box::new(inflight_requests.clone()))
            .expect("register inflight_requests");
        registry
            .register(Box::new(upstream_errors_total.clone()))
            .expect("register upstream_errors_total");

        Self {
            registry,
            proxy_requests_total,
            proxy_request_duration_seconds,
            inflight_requests,
            upstream_errors_total,
        }
    }

    pub fn inflight_guard(&self) -> InflightGuard<'_> {
        self.inflight_requests.inc();
        InflightGuard { metrics: self }
    }

    pub fn observe_request(&self, endpoint: &str, method: &str, status: u16, duration: Duration) {
        let status_label = status.to_string();
        self.proxy_requests_total
            .with_label_values(&[endpoint, method, &status_label])
            .inc();
        self.proxy_request_duration_seconds
            .with_label_values(&[endpoint, method])
            .observe(duration.as_secs_f64());
    }

    pub fn observe_upstream_error(&self, kind: &str) {
        self.upstream_errors_total.with_label_values(&[kind]).inc();
    }

    pub fn render(&self) -> Result<String, String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|error| error.to_string())?;
        String::from_utf8(buffer).map_err(|error| error.to_string())
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.metrics.inflight_requests.dec();
    }
}
