use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gemini_proxy_requests_total", "Total number of forwarded requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("gemini_proxy_rate_limited_total", "Requests rejected by the local rate limit").unwrap();
    pub static ref UPSTREAM_ERRORS_TOTAL: Counter =
        register_counter!("gemini_proxy_upstream_errors_total", "Upstream calls that failed or returned an error").unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "gemini_proxy_upstream_latency_seconds",
        "Upstream round trip in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_KEYS: Gauge =
        register_gauge!("gemini_proxy_rate_limit_keys", "Client keys currently tracked by the rate limiter").unwrap();
}
