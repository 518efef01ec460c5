#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use gemini_proxy::AppState;
use gemini_proxy::config::ProxyFeatures;
use gemini_proxy::rate_limit::RateLimiter;
use gemini_proxy::startup::{PROXY_PATH, build_router};
use gemini_proxy::upstream::GeminiClient;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_MODEL: &str = "test-model";
pub const TEST_KEY: &str = "test-key";
pub const UPSTREAM_PATH: &str = "/models/test-model:generateContent";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub fn spawn_app(upstream_uri: &str, api_key: Option<&str>, features: ProxyFeatures) -> TestApp {
    let state = Arc::new(AppState {
        upstream: GeminiClient::new(upstream_uri, TEST_MODEL).expect("valid upstream url"),
        api_key: api_key.map(str::to_string),
        rate_limiter: RateLimiter::in_memory(10, Duration::from_secs(60)),
        features,
        max_body_bytes: 1024 * 1024,
    });

    TestApp {
        router: build_router(state.clone()),
        state,
    }
}

pub fn post_json(body: &Value, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(PROXY_PATH)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(ip) = forwarded_for {
        builder = builder.header("x-forwarded-for", ip);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn read_body(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes()
        .to_vec()
}

pub async fn read_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json body")
}

pub fn assert_cors(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
}
