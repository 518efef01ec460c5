use clap::{ArgAction, Parser};
use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "gemini-proxy")]
#[command(about = "CORS-friendly proxy that injects a server-held Gemini API key")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Upstream credential, a missing key is reported per request, not at startup
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    // Base URL of the generative language API
    #[arg(long, env = "GEMINI_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    // Model id used in the generateContent path
    #[arg(short, long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // Per-client rate limiting on forwarded requests
    #[arg(long, env = "ENABLE_RATE_LIMIT", default_value_t = true, action = ArgAction::Set)]
    pub enable_rate_limit: bool,

    // Collapse upstream quota errors into QUOTA_EXCEEDED
    #[arg(long, env = "ENABLE_QUOTA_MAPPING", default_value_t = false, action = ArgAction::Set)]
    pub enable_quota_mapping: bool,

    // How often expired rate limit records are swept, in seconds
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 300)]
    pub sweep_interval: u64,

    // Largest inbound body accepted
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 4 * 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl Args {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }

    pub fn features(&self) -> ProxyFeatures {
        ProxyFeatures {
            rate_limit: self.enable_rate_limit,
            quota_mapping: self.enable_quota_mapping,
        }
    }
}

/// Switches between the two handler behaviours: the rate limited proxy and
/// the one that masks upstream quota errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyFeatures {
    pub rate_limit: bool,
    pub quota_mapping: bool,
}

impl Default for ProxyFeatures {
    fn default() -> Self {
        Self {
            rate_limit: true,
            quota_mapping: false,
        }
    }
}
