//! Mapping between the employee tool catalog and MCP protocol types.

use std::sync::Arc;

use hrdesk_agent::{ToolDescriptor, ToolResponse};
use rmcp::model::{CallToolResult, Content, Tool};

use crate::McpResult;

/// MCP tool definition carrying the descriptor's JSON schema.
pub fn tool_definition(descriptor: &ToolDescriptor) -> Tool {
    Tool::new(descriptor.name, descriptor.description, Arc::new(descriptor.input_schema()))
}

/// Envelope as pretty JSON text; unsuccessful envelopes are flagged as tool errors.
pub fn call_result(response: &ToolResponse) -> McpResult<CallToolResult> {
    let content = vec![Content::text(serde_json::to_string_pretty(response)?)];
    Ok(if response.success {
        CallToolResult::success(content)
    } else {
        CallToolResult::error(content)
    })
}
