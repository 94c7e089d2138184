//! Development HTTP Server Binary
//!
//! Starts the REST API used by the browser canvas editor, backed by a
//! project registry on the local filesystem.
//!
//! # Usage
//!
//! ```bash
//! # Default settings (port 3001, projects under ~/.rulegraph/projects)
//! cargo run -p rulegraph-dev-tools --bin dev-server
//!
//! # Custom port and data directory
//! DEV_SERVER_PORT=3002 RULEGRAPH_DATA_DIR=/tmp/rulegraph cargo run -p rulegraph-dev-tools --bin dev-server
//! ```
//!
//! # Environment Variables
//!
//! - `DEV_SERVER_PORT`: Server port (default: 3001)
//! - `RULEGRAPH_DATA_DIR`, `RULEGRAPH_ACCESSORIES`, `RULEGRAPH_PERSIST_ATTEMPTS`,
//!   `RULEGRAPH_PERSIST_TIMEOUT_MS`: graph configuration
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::env;
use std::sync::Arc;

use rulegraph_core::{GraphConfig, ProjectRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("RuleGraph HTTP Dev Server");

    let port = env::var("DEV_SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3001);

    let config = GraphConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Invalid graph configuration: {}", e))?;

    tracing::info!("Port: {}", port);
    tracing::info!("Projects: {}", config.data_dir.display());
    tracing::info!("Accessories enabled: {}", config.accessories_enabled);

    let registry = Arc::new(ProjectRegistry::new(config)?);

    rulegraph_dev_tools::dev_server::start_server(registry, port).await?;

    Ok(())
}
