pub mod http;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::{errors::BridgeError, models::StreamChunk};

pub type ByteStream = BoxStream<'static, Result<Bytes, BridgeError>>;
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, BridgeError>>;

/// A fully resolved request, ready to be sent to the backend origin.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Backend response with its body still on the wire.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl UpstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, BridgeError>;
}
