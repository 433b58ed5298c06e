//! Runtime bootstrap: tracing, configuration, and the cooperative dashboard loop.

use tracing_subscriber::EnvFilter;

pub mod config;
pub mod dashboard;
pub mod metrics;

pub use config::{load_config, DashboardConfig};
pub use dashboard::Dashboard;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
