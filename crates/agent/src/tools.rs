use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use hrdesk_core::domain::employee::{
    Employee, EmployeeChanges, EmployeeCode, EmployeeStatus, NewEmployee,
};

use crate::executor::{ExecutionError, OperationExecutor};
use crate::operation::{Operation, Outcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SearchEmployee,
    GetEmployeeById,
    CreateEmployee,
    UpdateEmployee,
    ListEmployees,
    GetDepartments,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
}

impl ParameterKind {
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParameterKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParameterSpec {
    fn required(name: &'static str, description: &'static str) -> Self {
        Self { name, kind: ParameterKind::String, required: true, description }
    }

    fn optional(name: &'static str, description: &'static str) -> Self {
        Self { name, kind: ParameterKind::String, required: false, description }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDescriptor {
    /// JSON Schema object describing the accepted arguments.
    pub fn input_schema(&self) -> Map<String, Value> {
        let properties = self
            .parameters
            .iter()
            .map(|parameter| {
                (
                    parameter.name.to_string(),
                    json!({
                        "type": parameter.kind.json_type(),
                        "description": parameter.description,
                    }),
                )
            })
            .collect::<Map<_, _>>();
        let required = self
            .parameters
            .iter()
            .filter(|parameter| parameter.required)
            .map(|parameter| Value::from(parameter.name))
            .collect::<Vec<_>>();

        let mut schema = Map::new();
        schema.insert("type".into(), Value::from("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), Value::Array(required));
        schema.insert("additionalProperties".into(), Value::Bool(false));
        schema
    }

    fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }
}

/// Immutable tool catalog handed to the dispatcher at construction.
#[derive(Clone, Debug)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            ToolDescriptor {
                kind: ToolKind::SearchEmployee,
                name: "search_employee",
                description: "根据姓名搜索员工信息，支持模糊匹配",
                parameters: vec![ParameterSpec::required("name", "员工姓名（支持部分匹配）")],
            },
            ToolDescriptor {
                kind: ToolKind::GetEmployeeById,
                name: "get_employee_by_id",
                description: "根据工号获取员工详细信息",
                parameters: vec![ParameterSpec::required("employee_id", "员工工号，如EMP001")],
            },
            ToolDescriptor {
                kind: ToolKind::CreateEmployee,
                name: "create_employee",
                description: "创建新员工记录",
                parameters: vec![
                    ParameterSpec::required("name", "员工姓名"),
                    ParameterSpec::required("department", "所属部门"),
                    ParameterSpec::optional("employee_id", "员工工号（可选，不提供则自动生成）"),
                    ParameterSpec::optional("account", "HR账号（可选，不提供则自动生成）"),
                ],
            },
            ToolDescriptor {
                kind: ToolKind::UpdateEmployee,
                name: "update_employee",
                description: "更新员工信息",
                parameters: vec![
                    ParameterSpec::required("name", "员工姓名（用于查找员工）"),
                    ParameterSpec::optional("department", "新的部门名称（可选）"),
                    ParameterSpec::optional("account", "新的HR账号（可选）"),
                    ParameterSpec::optional("status", "员工状态：active/在职 或 departed/离职（可选）"),
                ],
            },
            ToolDescriptor {
                kind: ToolKind::ListEmployees,
                name: "list_employees",
                description: "获取员工列表，支持按部门和状态筛选",
                parameters: vec![
                    ParameterSpec::optional("department", "部门名称（可选）"),
                    ParameterSpec::optional("status", "员工状态：active/在职 或 departed/离职（可选）"),
                ],
            },
            ToolDescriptor {
                kind: ToolKind::GetDepartments,
                name: "get_departments",
                description: "获取所有部门列表",
                parameters: Vec::new(),
            },
        ])
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid argument for `{tool}`: {message}")]
    InvalidArgument { tool: String, message: String },
}

/// Envelope returned by every tool call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResponse {
    fn ok(message: impl Into<String>, data: Value) -> Self {
        Self { success: true, message: message.into(), data: Some(data) }
    }

    fn failed(message: impl Into<String>, data: Option<Value>) -> Self {
        Self { success: false, message: message.into(), data }
    }
}

/// Structured entry point. Arguments are checked against the catalog before
/// a typed [`Operation`] is built; free-text extraction is never involved.
pub struct ToolDispatcher {
    catalog: ToolCatalog,
    executor: OperationExecutor,
}

impl ToolDispatcher {
    pub fn new(catalog: ToolCatalog, executor: OperationExecutor) -> Self {
        Self { catalog, executor }
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        self.catalog.descriptors()
    }

    pub async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolResponse, DispatchError> {
        let tool =
            self.catalog.get(name).ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;
        let args = ValidatedArguments::check(tool, arguments)?;
        let operation = build_operation(tool, &args)?;

        tracing::debug!(
            event_name = "agent.tools.invoke",
            tool = tool.name,
            operation = operation.kind(),
            "dispatching tool call"
        );

        Ok(match self.executor.execute(operation).await {
            Ok(outcome) => render(tool.kind, outcome),
            Err(error) => store_failure(tool.kind, &error),
        })
    }
}

/// Arguments that passed the per-tool contract: known names, string values,
/// required ones present and non-blank. Null optional values count as absent.
struct ValidatedArguments<'a> {
    tool: &'a ToolDescriptor,
    values: Vec<(&'static str, String)>,
}

impl<'a> ValidatedArguments<'a> {
    fn check(
        tool: &'a ToolDescriptor,
        arguments: &Map<String, Value>,
    ) -> Result<Self, DispatchError> {
        if let Some(unexpected) = arguments.keys().find(|key| tool.parameter(key).is_none()) {
            return Err(invalid(tool, format!("unexpected argument `{unexpected}`")));
        }

        let mut values = Vec::new();
        for parameter in &tool.parameters {
            match arguments.get(parameter.name) {
                None | Some(Value::Null) if parameter.required => {
                    return Err(invalid(
                        tool,
                        format!("missing required argument `{}`", parameter.name),
                    ));
                }
                None | Some(Value::Null) => {}
                Some(Value::String(raw)) => {
                    let trimmed = raw.trim();
                    if trimmed.is_empty() && parameter.required {
                        return Err(invalid(
                            tool,
                            format!("argument `{}` must not be blank", parameter.name),
                        ));
                    }
                    if !trimmed.is_empty() {
                        values.push((parameter.name, trimmed.to_string()));
                    }
                }
                Some(other) => {
                    return Err(invalid(
                        tool,
                        format!(
                            "argument `{}` must be a {}, got {}",
                            parameter.name,
                            parameter.kind.json_type(),
                            json_kind(other)
                        ),
                    ));
                }
            }
        }

        Ok(Self { tool, values })
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values.iter().find(|(key, _)| *key == name).map(|(_, value)| value.as_str())
    }

    fn require(&self, name: &str) -> Result<String, DispatchError> {
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| invalid(self.tool, format!("missing required argument `{name}`")))
    }

    fn status(&self) -> Result<Option<EmployeeStatus>, DispatchError> {
        self.get("status")
            .map(|raw| raw.parse::<EmployeeStatus>().map_err(|error| invalid(self.tool, error.to_string())))
            .transpose()
    }

    fn code(&self, name: &str) -> Result<Option<EmployeeCode>, DispatchError> {
        self.get(name)
            .map(|raw| EmployeeCode::parse(raw).map_err(|error| invalid(self.tool, error.to_string())))
            .transpose()
    }
}

fn build_operation(
    tool: &ToolDescriptor,
    args: &ValidatedArguments<'_>,
) -> Result<Operation, DispatchError> {
    Ok(match tool.kind {
        ToolKind::SearchEmployee => Operation::QueryByName { name: args.require("name")? },
        ToolKind::GetEmployeeById => Operation::GetByCode {
            code: args
                .code("employee_id")?
                .ok_or_else(|| invalid(tool, "missing required argument `employee_id`"))?,
        },
        ToolKind::CreateEmployee => Operation::CreateEmployee(NewEmployee {
            code: args.code("employee_id")?,
            account: args.get("account").map(str::to_string),
            ..NewEmployee::new(args.require("name")?, args.require("department")?)
        }),
        ToolKind::UpdateEmployee => {
            let changes = EmployeeChanges {
                name: None,
                department: args.get("department").map(str::to_string),
                account: args.get("account").map(str::to_string),
                status: args.status()?,
            };
            if changes.is_empty() {
                return Err(invalid(
                    tool,
                    "at least one of `department`, `account`, `status` is required",
                ));
            }
            Operation::UpdateEmployee { name: args.require("name")?, changes }
        }
        ToolKind::ListEmployees => Operation::ListEmployees {
            department: args.get("department").map(str::to_string),
            status: args.status()?,
        },
        ToolKind::GetDepartments => Operation::ListDepartments,
    })
}

fn render(kind: ToolKind, outcome: Outcome) -> ToolResponse {
    match (kind, outcome) {
        (ToolKind::SearchEmployee, Outcome::NotFound { query }) => ToolResponse::failed(
            format!("未找到姓名包含'{query}'的员工"),
            Some(json!({ "employees": [] })),
        ),
        (ToolKind::GetEmployeeById, Outcome::NotFound { query }) => {
            ToolResponse::failed(format!("未找到工号为'{query}'的员工"), None)
        }
        (_, Outcome::NotFound { query }) => ToolResponse::failed(format!("未找到员工 {query}"), None),
        (ToolKind::GetEmployeeById, Outcome::Single(employee)) => {
            ToolResponse::ok("查询成功", json!({ "employee": employee }))
        }
        (_, Outcome::Single(employee)) => employee_list("找到 1 名员工", vec![employee]),
        (_, Outcome::Matches(employees)) => {
            employee_list(format!("找到 {} 名员工", employees.len()), employees)
        }
        (_, Outcome::Listing(employees)) => {
            employee_list(format!("查询成功，共找到 {} 名员工", employees.len()), employees)
        }
        (_, Outcome::Ambiguous { name, candidates }) => ToolResponse::failed(
            format!("找到多个名为 {name} 的员工，请提供更具体的信息"),
            Some(json!({ "employees": candidates })),
        ),
        (_, Outcome::Created(employee)) => ToolResponse::ok(
            format!("员工 {} 创建成功", employee.name),
            json!({ "employee": employee }),
        ),
        (_, Outcome::Conflict { code }) => ToolResponse::failed(format!("工号 {code} 已存在"), None),
        (_, Outcome::Updated(employee)) => ToolResponse::ok(
            format!("员工 {} 信息更新成功", employee.name),
            json!({ "employee": employee }),
        ),
        (_, Outcome::DepartmentChanged { employee, previous_department }) => ToolResponse::ok(
            format!("员工 {} 信息更新成功", employee.name),
            json!({ "employee": employee, "previous_department": previous_department }),
        ),
        (_, Outcome::NothingToUpdate) => ToolResponse::failed("没有提供有效的更新字段", None),
        (_, Outcome::Departments(departments)) => ToolResponse::ok(
            format!("共有 {} 个部门", departments.len()),
            json!({ "departments": departments }),
        ),
    }
}

fn employee_list(message: impl Into<String>, employees: Vec<Employee>) -> ToolResponse {
    ToolResponse::ok(message, json!({ "employees": employees }))
}

fn store_failure(kind: ToolKind, error: &ExecutionError) -> ToolResponse {
    let action = match kind {
        ToolKind::SearchEmployee => "搜索",
        ToolKind::CreateEmployee => "创建",
        ToolKind::UpdateEmployee => "更新",
        ToolKind::GetEmployeeById | ToolKind::ListEmployees | ToolKind::GetDepartments => "查询",
    };
    tracing::warn!(
        event_name = "agent.tools.store_failure",
        error = %error,
        "tool call failed against the record store"
    );
    ToolResponse::failed(format!("{action}失败: {error}"), None)
}

fn invalid(tool: &ToolDescriptor, message: impl Into<String>) -> DispatchError {
    DispatchError::InvalidArgument { tool: tool.name.to_string(), message: message.into() }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
