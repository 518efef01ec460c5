use crate::config::{Args, ProxyFeatures};
use crate::rate_limit::RateLimiter;
use crate::upstream::{GeminiClient, UpstreamError};
// app's shared state

pub struct AppState {
    pub upstream: GeminiClient,
    pub api_key: Option<String>, // read once from the environment, checked per request
    pub rate_limiter: RateLimiter,
    pub features: ProxyFeatures,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self, UpstreamError> {
        Ok(Self {
            upstream: GeminiClient::new(&args.upstream_url, &args.model)?,
            // an empty variable counts as unset
            api_key: args.api_key.clone().filter(|k| !k.is_empty()),
            rate_limiter: RateLimiter::in_memory(args.rate_limit, args.rate_window()),
            features: args.features(),
            max_body_bytes: args.max_body_bytes,
        })
    }
}
