//! The two operations the chat front end calls: list models and generate.

use axum::http::{header::ACCEPT, header::CONTENT_TYPE, HeaderMap, HeaderValue, Method};
use bytes::Bytes;
use futures_util::{StreamExt, TryStreamExt};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    backend::{ChunkStream, UpstreamRequest, UpstreamResponse},
    decoder::{decode_stream, DecodeSession, Framing, PayloadShape},
    dialect::{Dialect, LogicalEndpoint},
    errors::BridgeError,
    models::{
        GenerationRequest, GenerationResult, ModelInfo, NativeTagsResponse, OpenAiModelsResponse,
        StreamChunk,
    },
    router::{PathRouter, ResolvedRoute},
};

const ERROR_BODY_LIMIT: usize = 400;

#[derive(Clone)]
pub struct BridgeClient {
    router: PathRouter,
}

impl BridgeClient {
    pub fn new(router: PathRouter) -> Self {
        Self { router }
    }

    /// Lists the backend's models. A body of the wrong shape is an
    /// `UpstreamError`; no default list is substituted.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, BridgeError> {
        let route = self.router.resolve_endpoint(LogicalEndpoint::ListModels)?;
        let response = self.send(&route, Method::GET, Bytes::new(), false).await?;
        let status = response.status.as_u16();
        let body = collect_body(response).await?;

        let models: Vec<ModelInfo> = match route.dialect {
            Dialect::Native => serde_json::from_slice::<NativeTagsResponse>(&body)
                .map(|parsed| parsed.models.into_iter().map(ModelInfo::from).collect()),
            Dialect::OpenAiCompatible => serde_json::from_slice::<OpenAiModelsResponse>(&body)
                .map(|parsed| parsed.data.into_iter().map(ModelInfo::from).collect()),
        }
        .map_err(|error| BridgeError::UpstreamError {
            status,
            body: format!("unexpected model list shape: {error}"),
        })?;

        info!(dialect = %route.dialect, count = models.len(), "listed backend models");
        Ok(models)
    }

    /// Non-streaming generation. Always asks the backend for a single document.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, BridgeError> {
        let request = GenerationRequest {
            stream: false,
            ..request
        };
        let mut chunks = self.stream_generate(request).await?;
        let mut result = GenerationResult::default();
        while let Some(chunk) = chunks.try_next().await? {
            result.push(&chunk);
            if chunk.is_final {
                break;
            }
        }
        Ok(result)
    }

    /// Starts a generation and returns its chunks lazily.
    ///
    /// The sequence ends with the first chunk whose `is_final` is set. Dropping
    /// the stream closes the backend response.
    pub async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> Result<ChunkStream, BridgeError> {
        request.validate().map_err(BridgeError::BadRequest)?;
        let route = self
            .router
            .resolve_endpoint(LogicalEndpoint::ChatCompletion)?;
        let payload = json!({
            "model": request.model,
            "messages": request.messages,
            "stream": request.stream,
        });
        let body = Bytes::from(payload.to_string());

        let response = self.send(&route, Method::POST, body, request.stream).await?;
        let framing = Framing::detect(response.content_type(), route.dialect, request.stream);
        let shape = PayloadShape::for_endpoint(route.dialect, route.endpoint);
        debug!(
            model = %request.model,
            dialect = %route.dialect,
            %framing,
            "decoding generation response"
        );

        let session = DecodeSession::new(framing, shape).with_status(response.status.as_u16());
        Ok(decode_stream(response.body, session))
    }

    /// Streams a generation through `on_chunk` and returns the aggregate text.
    pub async fn generate_streaming<F>(
        &self,
        request: GenerationRequest,
        mut on_chunk: F,
    ) -> Result<GenerationResult, BridgeError>
    where
        F: FnMut(&StreamChunk) + Send,
    {
        let request = GenerationRequest {
            stream: true,
            ..request
        };
        let mut chunks = self.stream_generate(request).await?;
        let mut result = GenerationResult::default();
        while let Some(next) = chunks.next().await {
            let chunk = match next {
                Ok(chunk) => chunk,
                Err(error) => {
                    warn!(error = %error, received = result.as_str().len(), "generation stream failed");
                    return Err(error);
                }
            };
            on_chunk(&chunk);
            result.push(&chunk);
            if chunk.is_final {
                break;
            }
        }
        Ok(result)
    }

    async fn send(
        &self,
        route: &ResolvedRoute,
        method: Method,
        body: Bytes,
        streaming: bool,
    ) -> Result<UpstreamResponse, BridgeError> {
        let mut headers = HeaderMap::new();
        if !body.is_empty() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        let accept = match (streaming, route.dialect) {
            (true, Dialect::OpenAiCompatible) => "text/event-stream",
            (true, Dialect::Native) => "application/x-ndjson",
            (false, _) => "application/json",
        };
        headers.insert(ACCEPT, HeaderValue::from_static(accept));

        let response = self
            .router
            .send(UpstreamRequest {
                method,
                url: self.router.url_for(route, None),
                headers,
                body,
            })
            .await?;

        if !response.status.is_success() {
            let status = response.status.as_u16();
            let body = collect_body(response).await.unwrap_or_default();
            let body = String::from_utf8_lossy(&body)
                .chars()
                .take(ERROR_BODY_LIMIT)
                .collect::<String>();
            warn!(endpoint = route.endpoint.as_str(), status, "backend returned error status");
            return Err(BridgeError::UpstreamError { status, body });
        }
        Ok(response)
    }
}

async fn collect_body(response: UpstreamResponse) -> Result<Vec<u8>, BridgeError> {
    response
        .body
        .try_fold(Vec::new(), |mut collected, bytes| async move {
            collected.extend_from_slice(&bytes);
            Ok(collected)
        })
        .await
}
