//! hrdesk MCP Server Binary
//!
//! ## Usage
//!
//! ```bash
//! # Run with default database (hrdesk.db in the working directory)
//! hrdesk-mcp
//!
//! # Run with a specific database
//! HRDESK_DATABASE_URL=sqlite://data/hrdesk.db hrdesk-mcp
//! ```

use anyhow::Result;
use hrdesk_core::config::{AppConfig, LoadOptions};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;

    // stdout carries the protocol, so logs go to stderr.
    let log_level = config.logging.level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level)
        .init();

    info!(event_name = "system.mcp.starting", "starting hrdesk MCP server");

    let server = hrdesk_mcp::HrMcpServer::from_config(&config).await?;
    server.run_stdio().await?;

    Ok(())
}
