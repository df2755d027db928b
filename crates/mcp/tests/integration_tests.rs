//! Integration tests for the hrdesk MCP server
//!
//! These tests verify that the MCP server correctly handles:
//! - Tool listing with JSON schemas
//! - Tool calls against a seeded roster
//! - Error handling for contract violations

use std::sync::Arc;

use hrdesk_agent::{OperationExecutor, ToolCatalog, ToolDispatcher};
use hrdesk_db::{InMemoryEmployeeRepository, SampleRoster};
use hrdesk_mcp::{HrMcpServer, McpError};
use rmcp::model::CallToolResult;
use rmcp::ServerHandler;
use serde_json::{json, Map, Value};

async fn seeded_server() -> HrMcpServer {
    let repository = Arc::new(InMemoryEmployeeRepository::new());
    SampleRoster::load_into(repository.as_ref()).await.expect("seed roster");
    let executor = OperationExecutor::new(repository);
    HrMcpServer::new(Arc::new(ToolDispatcher::new(ToolCatalog::standard(), executor)))
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn envelope(result: &CallToolResult) -> Value {
    let text = result
        .content
        .first()
        .and_then(|content| content.as_text())
        .map(|text| text.text.clone())
        .expect("text content");
    serde_json::from_str(&text).expect("envelope json")
}

#[test]
fn server_info_enables_tools() {
    let server = HrMcpServer::new(Arc::new(ToolDispatcher::new(
        ToolCatalog::standard(),
        OperationExecutor::new(Arc::new(InMemoryEmployeeRepository::new())),
    )));

    let info = server.get_info();
    assert!(info.capabilities.tools.is_some());
    assert!(info.instructions.is_some());
}

#[tokio::test]
async fn lists_all_six_tools_with_schemas() {
    let server = seeded_server().await;

    let tools = server.tool_definitions();
    let names = tools.iter().map(|tool| tool.name.to_string()).collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            "search_employee",
            "get_employee_by_id",
            "create_employee",
            "update_employee",
            "list_employees",
            "get_departments"
        ]
    );

    let create = tools.iter().find(|tool| tool.name == "create_employee").expect("create tool");
    assert_eq!(create.input_schema.get("type"), Some(&json!("object")));
    assert_eq!(create.input_schema.get("required"), Some(&json!(["name", "department"])));
}

#[tokio::test]
async fn get_employee_by_id_returns_seeded_record() {
    let server = seeded_server().await;

    let result = server
        .call("get_employee_by_id", &args(json!({"employee_id": "EMP002"})))
        .await
        .expect("call");

    assert_ne!(result.is_error, Some(true));
    let body = envelope(&result);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["employee"]["name"], json!("李四"));
    assert_eq!(body["data"]["employee"]["department"], json!("市场部"));
}

#[tokio::test]
async fn create_then_search_sees_new_employee() {
    let server = seeded_server().await;

    let created = server
        .call("create_employee", &args(json!({"name": "王小敏", "department": "市场部"})))
        .await
        .expect("create");
    let body = envelope(&created);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["employee"]["employee_id"], json!("EMP006"));

    let found =
        server.call("search_employee", &args(json!({"name": "王小敏"}))).await.expect("search");
    let body = envelope(&found);
    assert_eq!(body["data"]["employees"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn duplicate_code_is_an_error_flagged_result() {
    let server = seeded_server().await;

    let result = server
        .call(
            "create_employee",
            &args(json!({"name": "甲", "department": "技术部", "employee_id": "EMP001"})),
        )
        .await
        .expect("call");

    assert_eq!(result.is_error, Some(true));
    let body = envelope(&result);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("工号 EMP001 已存在"));
}

#[tokio::test]
async fn contract_violations_map_to_json_rpc_errors() {
    let server = seeded_server().await;

    let unknown = server.call("delete_employee", &Map::new()).await.expect_err("unknown tool");
    assert!(matches!(unknown, McpError::Dispatch(_)));
    assert_eq!(unknown.error_code(), -32601);

    let missing = server
        .call("create_employee", &args(json!({"name": "王小敏"})))
        .await
        .expect_err("missing department");
    assert_eq!(missing.error_code(), -32602);
}
