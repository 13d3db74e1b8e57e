use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header::{CONNECTION, CONTENT_TYPE, TRANSFER_ENCODING},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    errors::BridgeError,
    router::{InboundRequest, ResolvedRoute},
    state::AppState,
};

const MAX_INBOUND_BODY: usize = 16 * 1024 * 1024;

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(error) => {
            BridgeError::Internal(format!("metrics render failed: {error}")).into_response()
        }
    }
}

/// Reverse-proxies `/api/*` and `/v1/*` to the configured backend.
pub async fn proxy(State(state): State<AppState>, request: Request) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let _inflight = state.metrics.inflight_guard();

    let route = state.router.resolve_path(&path);
    let endpoint = route
        .as_ref()
        .map(|route| route.endpoint.as_str())
        .unwrap_or("unsupported");

    let result = match route {
        Ok(route) => forward(&state, &route, request).await,
        Err(error) => Err(error),
    };
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            state.metrics.observe_upstream_error(error.kind());
            warn!(%request_id, %method, %path, error = %error, "proxy request failed");
            error.into_response()
        }
    };

    let status = response.status().as_u16();
    state
        .metrics
        .observe_request(endpoint, method.as_str(), status, started.elapsed());
    info!(
        %request_id,
        %method,
        %path,
        endpoint,
        status,
        latency_ms = started.elapsed().as_millis() as u64,
        "proxied request"
    );

    response
}

async fn forward(
    state: &AppState,
    route: &ResolvedRoute,
    request: Request,
) -> Result<Response, BridgeError> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, MAX_INBOUND_BODY)
        .await
        .map_err(|error| BridgeError::BadRequest(format!("unreadable request body: {error}")))?;

    let inbound = InboundRequest {
        method: parts.method,
        path: parts.uri.path().to_owned(),
        query: parts.uri.query().map(ToOwned::to_owned),
        headers: parts.headers,
        body,
    };
    let upstream = state.router.forward(route, inbound).await?;
    if !upstream.status.is_success() {
        info!(
            endpoint = route.endpoint.as_str(),
            status = upstream.status.as_u16(),
            "passing through backend error status"
        );
    }

    let mut response = Response::new(Body::from_stream(upstream.body));
    *response.status_mut() = upstream.status;
    let headers = response.headers_mut();
    for (name, value) in &upstream.headers {
        if *name == TRANSFER_ENCODING || *name == CONNECTION {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    Ok(response)
}
