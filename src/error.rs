use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub const QUOTA_SENTINEL: &str = "QUOTA_EXCEEDED";

/// Every failure the proxy reports to the browser. The `Display` text is the
/// whole response body, so detail that must stay server-side is logged
/// before one of these is built and never stored in it.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Too many requests. Please wait a minute.")]
    TooManyRequests,

    #[error("Server configuration error: API key is missing.")]
    MissingApiKey,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Gemini API Error: {0}")]
    Upstream(String),

    #[error("QUOTA_EXCEEDED")]
    QuotaExceeded,

    #[error("Failed to fetch from Gemini API.")]
    Forwarding,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::TooManyRequests | ProxyError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::InvalidBody(_) | ProxyError::Upstream(_) => StatusCode::BAD_REQUEST,
            ProxyError::MissingApiKey | ProxyError::Forwarding => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
