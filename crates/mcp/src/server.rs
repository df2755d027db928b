//! MCP Server Implementation
//!
//! Implements the Model Context Protocol server for hrdesk.

use std::sync::Arc;

use rmcp::{
    model::*, service::RequestContext, ErrorData as McpErrorData, RoleServer, ServerHandler,
    ServiceExt,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use hrdesk_agent::{OperationExecutor, ToolCatalog, ToolDispatcher};
use hrdesk_core::config::AppConfig;
use hrdesk_db::{migrations, SqlEmployeeRepository};

use crate::tools::{call_result, tool_definition};
use crate::McpResult;

/// Main MCP server for hrdesk
#[derive(Clone)]
pub struct HrMcpServer {
    dispatcher: Arc<ToolDispatcher>,
}

impl HrMcpServer {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Connect to the configured database, apply migrations and build the standard catalog.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        info!(
            event_name = "system.mcp.connecting",
            database_url = %config.database.url,
            "connecting to employee database"
        );
        let pool = hrdesk_db::connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await?;
        migrations::run_pending(&pool).await?;

        let executor = OperationExecutor::with_account_domain(
            Arc::new(SqlEmployeeRepository::new(pool)),
            config.directory.account_domain.clone(),
        );
        Ok(Self::new(Arc::new(ToolDispatcher::new(ToolCatalog::standard(), executor))))
    }

    /// Run the server with stdio transport
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        info!(event_name = "system.mcp.started", "starting MCP server with stdio transport");

        let service = self.serve(rmcp::transport::stdio()).await?;
        let _quit = service.waiting().await?;

        info!(event_name = "system.mcp.stopped", "MCP server shutdown complete");
        Ok(())
    }

    pub fn tool_definitions(&self) -> Vec<Tool> {
        self.dispatcher.list_tools().iter().map(tool_definition).collect()
    }

    /// Dispatch one tool call. Contract violations are errors; store-level
    /// failures come back as an error-flagged result.
    pub async fn call(&self, name: &str, arguments: &Map<String, Value>) -> McpResult<CallToolResult> {
        debug!(event_name = "system.mcp.call_tool", tool = name, "tool call received");
        let response = self.dispatcher.invoke(name, arguments).await?;
        call_result(&response)
    }
}

impl ServerHandler for HrMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "hrdesk MCP Server - employee records for AI agents. \
                 Search employees by name or code, create employees, update department, \
                 account or status, and list employees and departments."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_definitions()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpErrorData> {
        let arguments = request.arguments.unwrap_or_default();
        self.call(&request.name, &arguments).await.map_err(|error| error.into_error_data())
    }
}
