use std::fmt::Write as _;

use hrdesk_core::domain::employee::Employee;

use crate::conversation::{Intent, IntentExtractor};
use crate::executor::{ExecutionError, OperationExecutor};
use crate::operation::{Operation, Outcome};
use crate::resolver::{ClarificationReason, OperationResolver};

pub const HELP_TEXT: &str = "我可以帮您：

🔍 **查询员工信息**
• \"查询张三的人事账号\"
• \"搜索李四的信息\"
• \"找王五的资料\"

➕ **新增员工**
• \"新增一个员工王小敏，部门是市场部\"
• \"添加员工赵六到技术部\"
• \"创建员工孙七，部门财务部\"

✏️ **修改员工信息**
• \"把李四的部门改为行政部\"
• \"修改张三的部门为人事部\"
• \"将王五调到市场部\"

请告诉我您需要什么帮助？";

/// Free-text entry point: extract, resolve, execute, reply.
#[derive(Clone)]
pub struct AgentRuntime {
    extractor: IntentExtractor,
    resolver: OperationResolver,
    executor: OperationExecutor,
}

impl AgentRuntime {
    pub fn new(executor: OperationExecutor) -> Self {
        Self { extractor: IntentExtractor::new(), resolver: OperationResolver::new(), executor }
    }

    /// Always produces a reply. Store failures become a failure sentence.
    pub async fn handle_message(&self, text: &str) -> String {
        let extraction = self.extractor.extract(text.trim());
        tracing::debug!(
            event_name = "agent.runtime.intent_classified",
            intent = ?extraction.intent,
            "classified free-text message"
        );

        let operation = match self.resolver.resolve(extraction.intent, &extraction.entities) {
            Ok(operation) => operation,
            Err(clarification) => return clarification_prompt(clarification.reason).to_string(),
        };

        let intent = extraction.intent;
        match self.executor.execute(operation).await {
            Ok(outcome) => render_reply(intent, outcome),
            Err(error) => failure_sentence(intent, &error),
        }
    }

    pub async fn execute(&self, operation: Operation) -> Result<Outcome, ExecutionError> {
        self.executor.execute(operation).await
    }
}

fn clarification_prompt(reason: ClarificationReason) -> &'static str {
    match reason {
        ClarificationReason::MissingName => "请提供要查询的员工姓名。",
        ClarificationReason::MissingNameOrDepartment { intent: Intent::Modify } => {
            "请提供要修改的员工姓名和新的部门信息。"
        }
        ClarificationReason::MissingNameOrDepartment { .. } => "请提供完整的员工信息，包括姓名和部门。",
        ClarificationReason::IntentNotRecognized => HELP_TEXT,
    }
}

fn render_reply(intent: Intent, outcome: Outcome) -> String {
    match outcome {
        Outcome::NotFound { query } if intent == Intent::Modify => format!("未找到员工'{query}'。"),
        Outcome::NotFound { query } => format!("未找到姓名包含'{query}'的员工。"),
        Outcome::Single(employee) => format!(
            "找到员工信息：\n• 姓名：{}\n• 工号：{}\n• 部门：{}\n• HR账号：{}\n• 状态：{}",
            employee.name,
            employee.code,
            employee.department,
            employee.account,
            employee.status.label()
        ),
        Outcome::Matches(employees) | Outcome::Listing(employees) => {
            let mut reply = format!("找到 {} 名员工：\n\n", employees.len());
            for employee in &employees {
                let _ = writeln!(
                    reply,
                    "• {} ({}) - {} - {}",
                    employee.name,
                    employee.code,
                    employee.department,
                    employee.status.label()
                );
            }
            reply
        }
        Outcome::Created(employee) => format!(
            "员工创建成功！\n• 姓名：{}\n• 工号：{}\n• 部门：{}\n• HR账号：{}\n• 状态：{}",
            employee.name,
            employee.code,
            employee.department,
            employee.account,
            employee.status.label()
        ),
        Outcome::Conflict { code } => format!("工号 {code} 已存在，请重试。"),
        Outcome::Ambiguous { name, candidates } => ambiguous_reply(&name, &candidates),
        Outcome::DepartmentChanged { employee, previous_department } => format!(
            "已成功将{}的部门从'{}'修改为'{}'。",
            employee.name, previous_department, employee.department
        ),
        Outcome::Updated(employee) => format!("员工 {} 信息更新成功。", employee.name),
        Outcome::NothingToUpdate => "没有提供有效的更新字段。".to_string(),
        Outcome::Departments(departments) => {
            format!("共有 {} 个部门：{}", departments.len(), departments.join("、"))
        }
    }
}

fn ambiguous_reply(name: &str, candidates: &[Employee]) -> String {
    let mut reply = format!("找到多个名为'{name}'的员工，请提供更具体的信息：\n");
    for employee in candidates {
        let _ = writeln!(reply, "• {} ({}) - {}", employee.name, employee.code, employee.department);
    }
    reply
}

fn failure_sentence(intent: Intent, error: &ExecutionError) -> String {
    tracing::warn!(
        event_name = "agent.runtime.execution_failed",
        intent = ?intent,
        error = %error,
        "free-text operation failed"
    );
    match intent {
        Intent::Create => format!("创建员工时出现错误：{error}"),
        Intent::Modify => format!("修改员工信息时出现错误：{error}"),
        Intent::Query | Intent::Unknown => format!("查询员工信息时出现错误：{error}"),
    }
}
