//! hrdesk MCP (Model Context Protocol) Server
//!
//! Exposes the employee tool catalog to AI agents over stdio. Every tool call
//! is validated and executed by the shared `ToolDispatcher`, so MCP callers
//! get exactly the contract the catalog describes.
//!
//! ## Architecture
//!
//! - `HrMcpServer`: `ServerHandler` implementation listing and calling tools
//! - `tools`: conversion between catalog descriptors / envelopes and MCP types
//!
//! ## Example Usage
//!
//! ```no_run
//! use hrdesk_core::config::{AppConfig, LoadOptions};
//! use hrdesk_mcp::HrMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(LoadOptions::default())?;
//!     let server = HrMcpServer::from_config(&config).await?;
//!     server.run_stdio().await
//! }
//! ```

mod server;
pub mod tools;

pub use server::HrMcpServer;

use hrdesk_agent::DispatchError;
use rmcp::model::ErrorCode;
use rmcp::ErrorData;
use thiserror::Error;

/// Errors specific to MCP server operations
#[derive(Error, Debug)]
pub enum McpError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::Dispatch(DispatchError::UnknownTool(_)) => -32601, // Method not found
            McpError::Dispatch(DispatchError::InvalidArgument { .. }) => -32602, // Invalid params
            McpError::Serialization(_) => -32603, // Internal error
        }
    }

    pub fn into_error_data(self) -> ErrorData {
        ErrorData::new(ErrorCode(self.error_code()), self.to_string(), None)
    }
}

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use hrdesk_agent::DispatchError;

    use super::McpError;

    #[test]
    fn dispatch_errors_map_to_json_rpc_codes() {
        let unknown = McpError::from(DispatchError::UnknownTool("x".into()));
        assert_eq!(unknown.error_code(), -32601);

        let invalid = McpError::from(DispatchError::InvalidArgument {
            tool: "create_employee".into(),
            message: "missing required argument `department`".into(),
        });
        assert_eq!(invalid.error_code(), -32602);
        assert!(invalid.to_string().contains("department"));
    }
}
