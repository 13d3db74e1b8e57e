use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no backend mapping for {path}")]
    UnsupportedEndpoint { path: String },
    #[error("upstream {origin} unreachable: {reason}")]
    UpstreamUnreachable { origin: String, reason: String },
    #[error("upstream returned status {status}: {body}")]
    UpstreamError { status: u16, body: String },
    #[error("stream interrupted after {} bytes of output: {reason}", .partial.len())]
    StreamInterrupted { partial: String, reason: String },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl BridgeError {
    /// Label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedEndpoint { .. } => "unsupported_endpoint",
            Self::UpstreamUnreachable { .. } => "upstream_unreachable",
            Self::UpstreamError { .. } => "upstream_error",
            Self::StreamInterrupted { .. } => "stream_interrupted",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "server_error",
        }
    }

    /// Whether re-running the request against another backend could help.
    pub fn is_retryable_elsewhere(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnreachable { .. } | Self::UpstreamError { .. }
        )
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = match &self {
            BridgeError::UnsupportedEndpoint { .. } => StatusCode::NOT_FOUND,
            BridgeError::UpstreamUnreachable { .. } | BridgeError::StreamInterrupted { .. } => {
                StatusCode::BAD_GATEWAY
            }
            BridgeError::UpstreamError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            BridgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BridgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        make_error_response(status, self.kind(), self.to_string())
    }
}

fn make_error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    let payload = ErrorEnvelope {
        error: ErrorBody {
            message,
            error_type: error_type.to_owned(),
        },
    };

    (status, Json(payload)).into_response()
}
