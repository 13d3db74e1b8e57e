use std::sync::Arc;

use axum::http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE, HOST},
    HeaderMap, HeaderValue, Method,
};
use bytes::Bytes;
use tracing::debug;

use crate::{
    backend::{UpstreamRequest, UpstreamResponse, UpstreamTransport},
    config::BackendConfig,
    dialect::{self, Dialect, DialectPreference, LogicalEndpoint},
    errors::BridgeError,
};

/// Request as received from the browser side.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Where a logical endpoint lands on the configured backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub endpoint: LogicalEndpoint,
    pub dialect: Dialect,
    pub path: String,
}

#[derive(Clone)]
pub struct PathRouter {
    backend: BackendConfig,
    preference: DialectPreference,
    transport: Arc<dyn UpstreamTransport>,
}

impl PathRouter {
    pub fn new(
        backend: BackendConfig,
        preference: DialectPreference,
        transport: Arc<dyn UpstreamTransport>,
    ) -> Self {
        Self {
            backend,
            preference,
            transport,
        }
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    pub fn preference(&self) -> DialectPreference {
        self.preference
    }

    /// Resolves an inbound path. Never touches the network.
    pub fn resolve_path(&self, inbound_path: &str) -> Result<ResolvedRoute, BridgeError> {
        let (endpoint, hint) =
            dialect::recognize(inbound_path).ok_or_else(|| BridgeError::UnsupportedEndpoint {
                path: inbound_path.to_owned(),
            })?;
        self.resolve(endpoint, Some(hint), inbound_path)
    }

    pub fn resolve_endpoint(&self, endpoint: LogicalEndpoint) -> Result<ResolvedRoute, BridgeError> {
        self.resolve(endpoint, None, endpoint.as_str())
    }

    fn resolve(
        &self,
        endpoint: LogicalEndpoint,
        hint: Option<Dialect>,
        requested: &str,
    ) -> Result<ResolvedRoute, BridgeError> {
        let (dialect, suffix) = self
            .preference
            .select(endpoint, hint)
            .and_then(|dialect| dialect.path_for(endpoint).map(|suffix| (dialect, suffix)))
            .ok_or_else(|| BridgeError::UnsupportedEndpoint {
                path: requested.to_owned(),
            })?;

        Ok(ResolvedRoute {
            endpoint,
            dialect,
            path: join_base_path(self.backend.base_path(), suffix),
        })
    }

    pub fn url_for(&self, route: &ResolvedRoute, query: Option<&str>) -> String {
        match query.filter(|query| !query.is_empty()) {
            Some(query) => format!("{}{}?{query}", self.backend.origin(), route.path),
            None => format!("{}{}", self.backend.origin(), route.path),
        }
    }

    /// Forwards an inbound request along a route from [`Self::resolve_path`]
    /// and hands back the raw backend response.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    pub async fn forward(
        &self,
        route: &ResolvedRoute,
        inbound: InboundRequest,
    ) -> Result<UpstreamResponse, BridgeError> {
        let url = self.url_for(route, inbound.query.as_deref());
        let headers = outbound_headers(&inbound.headers, !inbound.body.is_empty());

        debug!(
            endpoint = route.endpoint.as_str(),
            dialect = %route.dialect,
            inbound = %inbound.path,
            target = %route.path,
            "forwarding request"
        );

        self.transport
            .send(UpstreamRequest {
                method: inbound.method,
                url,
                headers,
                body: inbound.body,
            })
            .await
    }

    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, BridgeError> {
        self.transport.send(request).await
    }
}

/// Joins `base_path` and a dialect suffix. When trailing segments of the base
/// repeat the leading segments of the suffix, the overlap is kept once:
/// `/ollama/api` + `/api/tags` is `/ollama/api/tags`.
pub fn join_base_path(base_path: &str, suffix: &str) -> String {
    let base: Vec<&str> = base_path.split('/').filter(|s| !s.is_empty()).collect();
    let tail: Vec<&str> = suffix.split('/').filter(|s| !s.is_empty()).collect();

    let overlap = (1..=base.len().min(tail.len()))
        .rev()
        .find(|&n| base[base.len() - n..] == tail[..n])
        .unwrap_or(0);

    let mut joined = String::with_capacity(base_path.len() + suffix.len());
    for segment in base.iter().chain(&tail[overlap..]) {
        joined.push('/');
        joined.push_str(segment);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

/// Copies inbound headers for the backend. `Host` is dropped and
/// `Content-Length` is left for the transport to recompute from the body.
pub fn outbound_headers(inbound: &HeaderMap, has_body: bool) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if *name == HOST || *name == CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if has_body && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    headers
}
