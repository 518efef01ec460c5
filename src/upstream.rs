use reqwest::{StatusCode, Url, header};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),

    #[error("upstream request failed: {0}")]
    Request(reqwest::Error),

    #[error("upstream response was not json: {0}")]
    Decode(reqwest::Error),
}

/// Status and decoded body of one generateContent call.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Value,
}

pub struct GeminiClient {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str) -> Result<Self, UpstreamError> {
        let endpoint = Self::build_endpoint(base_url, model)?;
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    // "<base>/models/<model>:generateContent"
    fn build_endpoint(base_url: &str, model: &str) -> Result<Url, UpstreamError> {
        let raw = format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );
        Url::parse(&raw).map_err(|e| UpstreamError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Endpoint with the credential attached as the `key` query parameter.
    pub fn url_for(&self, api_key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", api_key);
        url
    }

    /// POSTs `body` and buffers the whole JSON reply. Non-2xx statuses are
    /// returned as replies, only transport and decode failures are errors.
    pub async fn generate(&self, api_key: &str, body: &Value) -> Result<UpstreamReply, UpstreamError> {
        let response = self
            .http_client
            .post(self.url_for(api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(UpstreamError::Request)?;

        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(UpstreamError::Decode)?;

        Ok(UpstreamReply { status, body })
    }
}
