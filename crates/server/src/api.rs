use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use hrdesk_agent::{AgentRuntime, Operation, OperationExecutor, Outcome};
use hrdesk_core::domain::employee::{
    EmployeeChanges, EmployeeCode, EmployeeFilter, EmployeeId, EmployeeStatus, NewEmployee,
};
use hrdesk_core::errors::{ApplicationError, DomainError, InterfaceError};

/// Envelope shared by every REST endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self { success: true, message: message.into(), data: Some(data) }
    }

    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self { success, message: message.into(), data: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::message(false, message)
    }
}

pub type ApiReply = (StatusCode, Json<ApiResponse>);

fn reply(status: StatusCode, response: ApiResponse) -> ApiReply {
    (status, Json(response))
}

#[derive(Clone)]
pub struct ApiState {
    executor: OperationExecutor,
    runtime: AgentRuntime,
}

impl ApiState {
    pub fn new(executor: OperationExecutor) -> Self {
        Self { runtime: AgentRuntime::new(executor.clone()), executor }
    }
}

/// Employee, department, stats and chat routes, relative to the `/api` prefix.
pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/search", get(search_employees))
        .route("/employees/{id}", get(get_employee).put(update_employee).delete(delete_employee))
        .route("/departments", get(list_departments))
        .route("/stats", get(statistics))
        .route("/ai/chat", post(chat))
        .with_state(state)
}

/// Mounts `routes` under `/api` with permissive CORS and an enveloped 404.
pub fn into_app(routes: Router) -> Router {
    Router::new().nest("/api", routes).fallback(not_found).layer(CorsLayer::permissive())
}

async fn not_found() -> ApiReply {
    reply(StatusCode::NOT_FOUND, ApiResponse::failed("接口不存在"))
}

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeQuery {
    pub name: Option<String>,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub account: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub account: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

async fn list_employees(
    State(state): State<ApiState>,
    Query(query): Query<EmployeeQuery>,
) -> ApiReply {
    let status = match parse_status(query.status) {
        Ok(status) => status,
        Err(error) => return rejected(error),
    };
    let filter = EmployeeFilter {
        name_contains: present(query.name),
        code: present(query.employee_id).map(EmployeeCode),
        department: present(query.department),
        status,
        ..EmployeeFilter::default()
    }
    .newest_first();

    match state.executor.repository().query(&filter).await {
        Ok(employees) => reply(
            StatusCode::OK,
            ApiResponse::ok(
                format!("查询成功，共找到 {} 名员工", employees.len()),
                json!({ "employees": employees }),
            ),
        ),
        Err(error) => store_failure("查询", error),
    }
}

async fn search_employees(
    State(state): State<ApiState>,
    Query(query): Query<EmployeeQuery>,
) -> ApiReply {
    let Some(name) = present(query.name) else {
        return reply(StatusCode::BAD_REQUEST, ApiResponse::failed("请提供员工姓名"));
    };

    match state.executor.execute(Operation::QueryByName { name }).await {
        Ok(Outcome::NotFound { query }) => {
            reply(StatusCode::OK, ApiResponse::failed(format!("未找到姓名包含'{query}'的员工")))
        }
        Ok(outcome) => {
            let employees = outcome.employees();
            reply(
                StatusCode::OK,
                ApiResponse::ok(
                    format!("找到 {} 名员工", employees.len()),
                    json!({ "employees": employees }),
                ),
            )
        }
        Err(error) => store_failure("搜索", error),
    }
}

async fn get_employee(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiReply {
    let Ok(Path(id)) = path else {
        return invalid_record_id();
    };
    match state.executor.repository().find_by_id(EmployeeId(id)).await {
        Ok(Some(employee)) => {
            reply(StatusCode::OK, ApiResponse::ok("查询成功", json!({ "employee": employee })))
        }
        Ok(None) => employee_missing(),
        Err(error) => store_failure("查询", error),
    }
}

async fn create_employee(
    State(state): State<ApiState>,
    body: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> ApiReply {
    let Ok(Json(body)) = body else {
        return reply(StatusCode::BAD_REQUEST, ApiResponse::failed("请提供员工信息"));
    };

    let name = present(body.name);
    let department = present(body.department);
    let (Some(name), Some(department)) = (name.clone(), department.clone()) else {
        let mut problems = Vec::new();
        if name.is_none() {
            problems.push("姓名不能为空");
        }
        if department.is_none() {
            problems.push("部门不能为空");
        }
        return reply(
            StatusCode::BAD_REQUEST,
            ApiResponse::failed(format!("数据验证失败: {}", problems.join(", "))),
        );
    };

    let code = match present(body.employee_id).map(|raw| EmployeeCode::parse(&raw)).transpose() {
        Ok(code) => code,
        Err(error) => return rejected(error),
    };
    let request = NewEmployee { code, account: present(body.account), ..NewEmployee::new(name, department) };

    match state.executor.execute(Operation::CreateEmployee(request)).await {
        Ok(Outcome::Created(employee)) => reply(
            StatusCode::CREATED,
            ApiResponse::ok(
                format!("员工 {} 创建成功", employee.name),
                json!({ "employee": employee }),
            ),
        ),
        Ok(Outcome::Conflict { code }) => {
            reply(StatusCode::BAD_REQUEST, ApiResponse::failed(format!("工号 {code} 已存在")))
        }
        Ok(other) => unexpected_outcome("create_employee", &other),
        Err(error) => store_failure("创建", error),
    }
}

async fn update_employee(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateEmployeeRequest>, JsonRejection>,
) -> ApiReply {
    let Ok(Path(id)) = path else {
        return invalid_record_id();
    };
    let Ok(Json(body)) = body else {
        return reply(StatusCode::BAD_REQUEST, ApiResponse::failed("请提供更新信息"));
    };

    let status = match parse_status(body.status) {
        Ok(status) => status,
        Err(error) => return rejected(error),
    };
    let changes = EmployeeChanges {
        name: present(body.name),
        department: present(body.department),
        account: present(body.account),
        status,
    };

    match state.executor.execute(Operation::UpdateRecord { id: EmployeeId(id), changes }).await {
        Ok(Outcome::Updated(employee)) => reply(
            StatusCode::OK,
            ApiResponse::ok("员工信息更新成功", json!({ "employee": employee })),
        ),
        Ok(Outcome::NothingToUpdate) => {
            reply(StatusCode::BAD_REQUEST, ApiResponse::failed("没有提供有效的更新字段"))
        }
        Ok(Outcome::NotFound { .. }) => employee_missing(),
        Ok(other) => unexpected_outcome("update_employee", &other),
        Err(error) => store_failure("更新", error),
    }
}

/// Soft delete: the record stays, its status becomes departed.
async fn delete_employee(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiReply {
    let Ok(Path(id)) = path else {
        return invalid_record_id();
    };
    let operation = Operation::UpdateRecord {
        id: EmployeeId(id),
        changes: EmployeeChanges::status(EmployeeStatus::Departed),
    };

    match state.executor.execute(operation).await {
        Ok(Outcome::Updated(employee)) => reply(
            StatusCode::OK,
            ApiResponse::message(true, format!("员工 {} 已设置为离职状态", employee.name)),
        ),
        Ok(Outcome::NotFound { .. }) => employee_missing(),
        Ok(other) => unexpected_outcome("delete_employee", &other),
        Err(error) => store_failure("删除", error),
    }
}

fn invalid_record_id() -> ApiReply {
    reply(StatusCode::BAD_REQUEST, ApiResponse::failed("员工ID无效"))
}

async fn list_departments(State(state): State<ApiState>) -> ApiReply {
    match state.executor.execute(Operation::ListDepartments).await {
        Ok(Outcome::Departments(departments)) => reply(
            StatusCode::OK,
            ApiResponse::ok(
                format!("共有 {} 个部门", departments.len()),
                json!({ "departments": departments }),
            ),
        ),
        Ok(other) => unexpected_outcome("list_departments", &other),
        Err(error) => store_failure("查询", error),
    }
}

async fn statistics(State(state): State<ApiState>) -> ApiReply {
    match state.executor.repository().stats().await {
        Ok(stats) => {
            reply(StatusCode::OK, ApiResponse::ok("统计信息获取成功", json!({ "stats": stats })))
        }
        Err(error) => store_failure("统计", error),
    }
}

async fn chat(
    State(state): State<ApiState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiReply {
    let Some(message) = body.ok().and_then(|Json(body)| body.message) else {
        return reply(StatusCode::BAD_REQUEST, ApiResponse::failed("请提供消息内容"));
    };
    let message = message.trim();
    if message.is_empty() {
        return reply(StatusCode::BAD_REQUEST, ApiResponse::failed("消息内容不能为空"));
    }

    let response = state.runtime.handle_message(message).await;
    reply(StatusCode::OK, ApiResponse::ok("处理成功", json!({ "response": response })))
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_status(raw: Option<String>) -> Result<Option<EmployeeStatus>, DomainError> {
    present(raw).map(|raw| raw.parse::<EmployeeStatus>()).transpose()
}

fn employee_missing() -> ApiReply {
    reply(StatusCode::NOT_FOUND, ApiResponse::failed("员工不存在"))
}

fn status_code(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rejected(error: DomainError) -> ApiReply {
    let message = format!("数据验证失败: {error}");
    let error = ApplicationError::from(error).into_interface(Uuid::new_v4().to_string());
    tracing::info!(
        event_name = "server.api.request_rejected",
        correlation_id = error.correlation_id(),
        error = %error,
        "request failed validation"
    );
    reply(status_code(&error), ApiResponse::failed(message))
}

fn store_failure(action: &str, error: impl std::fmt::Display) -> ApiReply {
    let message = format!("{action}失败: {error}");
    let error =
        ApplicationError::Persistence(error.to_string()).into_interface(Uuid::new_v4().to_string());
    tracing::error!(
        event_name = "server.api.store_failure",
        correlation_id = error.correlation_id(),
        error = %error,
        "employee store call failed"
    );
    reply(status_code(&error), ApiResponse::failed(message))
}

fn unexpected_outcome(route: &'static str, outcome: &Outcome) -> ApiReply {
    let error = ApplicationError::Configuration(format!("{route} produced {outcome:?}"))
        .into_interface(Uuid::new_v4().to_string());
    tracing::error!(
        event_name = "server.api.unexpected_outcome",
        correlation_id = error.correlation_id(),
        route,
        "operation produced an outcome the route does not render"
    );
    reply(status_code(&error), ApiResponse::failed(error.user_message()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use hrdesk_agent::OperationExecutor;
    use hrdesk_db::{InMemoryEmployeeRepository, SampleRoster};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{into_app, routes, ApiState};

    async fn seeded_app() -> Router {
        let repository = Arc::new(InMemoryEmployeeRepository::new());
        SampleRoster::load_into(repository.as_ref()).await.expect("seed roster");
        into_app(routes(ApiState::new(OperationExecutor::new(repository))))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response =
            app.clone().oneshot(request.body(body).expect("request")).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json envelope"))
    }

    #[tokio::test]
    async fn lists_employees_with_filters() {
        let app = seeded_app().await;

        let (status, body) = send(&app, Method::GET, "/api/employees", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("查询成功，共找到 5 名员工"));

        let (_, body) =
            send(&app, Method::GET, "/api/employees?department=%E6%8A%80%E6%9C%AF%E9%83%A8", None)
                .await;
        assert_eq!(body["data"]["employees"].as_array().map(Vec::len), Some(2));

        let (_, body) = send(&app, Method::GET, "/api/employees?status=departed", None).await;
        assert_eq!(body["data"]["employees"][0]["employee_id"], json!("EMP004"));

        let (status, body) = send(&app, Method::GET, "/api/employees?status=retired", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn search_requires_name_and_reports_misses() {
        let app = seeded_app().await;

        let (status, body) = send(&app, Method::GET, "/api/employees/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("请提供员工姓名"));

        // 王 -> %E7%8E%8B
        let (status, body) =
            send(&app, Method::GET, "/api/employees/search?name=%E7%8E%8B", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("找到 1 名员工"));
        assert_eq!(body["data"]["employees"][0]["name"], json!("王五"));

        // 周 -> %E5%91%A8
        let (_, body) = send(&app, Method::GET, "/api/employees/search?name=%E5%91%A8", None).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("未找到姓名包含'周'的员工"));
    }

    #[tokio::test]
    async fn create_assigns_next_code_and_rejects_duplicates() {
        let app = seeded_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/employees",
            Some(json!({ "name": "王小敏", "department": "市场部" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], json!("员工 王小敏 创建成功"));
        assert_eq!(body["data"]["employee"]["employee_id"], json!("EMP006"));
        assert_eq!(body["data"]["employee"]["status"], json!("active"));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/employees",
            Some(json!({ "name": "周八", "department": "行政部", "employee_id": "EMP006" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("工号 EMP006 已存在"));

        let (status, body) =
            send(&app, Method::POST, "/api/employees", Some(json!({ "name": "周八" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("数据验证失败: 部门不能为空"));
    }

    #[tokio::test]
    async fn update_and_soft_delete_by_row_id() {
        let app = seeded_app().await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/employees/2",
            Some(json!({ "department": "行政部", "status": "在职" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["employee"]["department"], json!("行政部"));

        let (status, body) = send(&app, Method::PUT, "/api/employees/2", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("没有提供有效的更新字段"));

        let (status, body) = send(&app, Method::DELETE, "/api/employees/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("员工 李四 已设置为离职状态"));

        let (_, body) = send(&app, Method::GET, "/api/employees/2", None).await;
        assert_eq!(body["data"]["employee"]["status"], json!("departed"));

        let (status, body) = send(&app, Method::DELETE, "/api/employees/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], json!("员工不存在"));
    }

    #[tokio::test]
    async fn departments_and_stats_count_active_employees() {
        let app = seeded_app().await;

        let (_, body) = send(&app, Method::GET, "/api/departments", None).await;
        assert_eq!(body["data"]["departments"], json!(["人事部", "市场部", "技术部"]));

        let (_, body) = send(&app, Method::GET, "/api/stats", None).await;
        let stats = &body["data"]["stats"];
        assert_eq!(stats["total_employees"], json!(5));
        assert_eq!(stats["active_employees"], json!(4));
        assert_eq!(stats["inactive_employees"], json!(1));
        assert_eq!(stats["department_stats"][0], json!({ "department": "技术部", "count": 2 }));
    }

    #[tokio::test]
    async fn chat_runs_the_conversational_pipeline() {
        let app = seeded_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ai/chat",
            Some(json!({ "message": "把李四的部门改为行政部" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["response"], json!("已成功将李四的部门从'市场部'修改为'行政部'。"));

        let (status, body) =
            send(&app, Method::POST, "/api/ai/chat", Some(json!({ "message": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("消息内容不能为空"));
    }

    #[tokio::test]
    async fn unknown_routes_get_an_enveloped_404() {
        let app = seeded_app().await;

        let (status, body) = send(&app, Method::GET, "/api/payroll", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], json!("接口不存在"));
    }

    #[tokio::test]
    async fn non_numeric_record_ids_get_an_enveloped_400() {
        let app = seeded_app().await;

        for (method, body) in [
            (Method::GET, None),
            (Method::PUT, Some(json!({ "department": "行政部" }))),
            (Method::DELETE, None),
        ] {
            let (status, reply) = send(&app, method.clone(), "/api/employees/abc", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
            assert_eq!(reply["success"], json!(false), "{method}");
            assert_eq!(reply["message"], json!("员工ID无效"), "{method}");
        }

        let (status, _) = send(&app, Method::GET, "/api/employees/1", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
