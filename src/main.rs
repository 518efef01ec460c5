use anyhow::Context;
use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use gemini_proxy::config::Args;
use gemini_proxy::rate_limit::sweeper;
use gemini_proxy::startup::{PROXY_PATH, build_router};
use gemini_proxy::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a local .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let state = Arc::new(AppState::from_args(&args).context("failed to build upstream client")?);

    if state.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set, forwarded requests will fail with 500");
    }

    if state.features.rate_limit {
        let limiter = state.rate_limiter.clone();
        let every = args.sweep_interval();
        tokio::spawn(async move {
            sweeper(limiter, every).await;
        });
    }

    let app = build_router(state.clone());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        port = args.port,
        path = PROXY_PATH,
        upstream = %state.upstream.endpoint(),
        "gemini proxy listening"
    );
    tracing::info!(
        enabled = state.features.rate_limit,
        max_requests = args.rate_limit,
        window_secs = args.rate_window,
        "rate limit"
    );
    tracing::info!(enabled = state.features.quota_mapping, "quota mapping");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
