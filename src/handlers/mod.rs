mod health;
mod metrics;
mod proxy;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use proxy::{client_key, map_upstream, preflight_handler, proxy_handler};
