use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use crate::{
    backend::{UpstreamRequest, UpstreamResponse, UpstreamTransport},
    config::BridgeConfig,
    errors::BridgeError,
};

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// `read_timeout` bounds the gap between reads, not the whole response.
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .map_err(|error| format!("failed to build backend HTTP client: {error}"))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, String> {
        Self::new(config.connect_timeout, config.read_timeout)
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    fn name(&self) -> &str {
        "http-transport"
    }

    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, BridgeError> {
        let origin = origin_of(&request.url);
        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|error| BridgeError::UpstreamUnreachable {
                origin: origin.clone(),
                reason: describe_send_error(&error),
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        debug!(transport = self.name(), %origin, status = status.as_u16(), "upstream responded");

        let body = response
            .bytes_stream()
            .map(|next| {
                next.map_err(|error| BridgeError::StreamInterrupted {
                    partial: String::new(),
                    reason: error.to_string(),
                })
            })
            .boxed();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

fn describe_send_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

fn origin_of(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.origin().ascii_serialization(),
        Err(_) => url.to_owned(),
    }
}
