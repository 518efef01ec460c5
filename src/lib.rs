pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod rate_limit;
pub mod startup;
pub mod state;
pub mod upstream;

pub use state::AppState;
