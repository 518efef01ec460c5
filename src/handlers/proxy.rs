use axum::{
    Json,
    body::to_bytes,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ProxyError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL, UPSTREAM_ERRORS_TOTAL, UPSTREAM_LATENCY};
use crate::rate_limit::RateDecision;
use crate::state::AppState;
use crate::upstream::UpstreamReply;

// Preflight - the CORS headers come from the router layer
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Value>, ProxyError> {
    REQUEST_TOTAL.inc();

    if state.features.rate_limit {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let key = client_key(request.headers(), peer);

        if let RateDecision::Limited { count } = state.rate_limiter.check(&key) {
            RATE_LIMITED_TOTAL.inc();
            tracing::warn!(client = %key, count, "rate limit exceeded");
            return Err(ProxyError::TooManyRequests);
        }
    }

    let Some(api_key) = state.api_key.as_deref() else {
        tracing::error!("GEMINI_API_KEY is not set, refusing to forward request");
        return Err(ProxyError::MissingApiKey);
    };

    let bytes = to_bytes(request.into_body(), state.max_body_bytes)
        .await
        .map_err(|e| ProxyError::InvalidBody(e.to_string()))?;
    let payload: Value =
        serde_json::from_slice(&bytes).map_err(|e| ProxyError::InvalidBody(e.to_string()))?;

    let start_time = Instant::now();
    let reply = state
        .upstream
        .generate(api_key, &payload)
        .await
        .map_err(|e| {
            UPSTREAM_ERRORS_TOTAL.inc();
            tracing::error!(error = %e, "error proxying request");
            ProxyError::Forwarding
        })?;
    UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());

    map_upstream(reply, state.features.quota_mapping).map(Json)
}

/// First `x-forwarded-for` hop, else the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Turns an upstream reply into the body sent to the browser.
pub fn map_upstream(reply: UpstreamReply, quota_mapping: bool) -> Result<Value, ProxyError> {
    let error = reply.body.get("error").filter(|e| !e.is_null());

    if quota_mapping {
        let quota_message = error
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .is_some_and(|m| m.to_lowercase().contains("quota"));

        if reply.status == StatusCode::TOO_MANY_REQUESTS || quota_message {
            UPSTREAM_ERRORS_TOTAL.inc();
            tracing::warn!(status = %reply.status, "upstream quota exhausted");
            return Err(ProxyError::QuotaExceeded);
        }
    }

    if let Some(error) = error {
        UPSTREAM_ERRORS_TOTAL.inc();
        tracing::error!(status = %reply.status, error = %error, "Gemini API returned an error");
        return Err(ProxyError::Upstream(error_message(error)));
    }

    Ok(reply.body)
}

fn error_message(error: &Value) -> String {
    match error.get("message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}
