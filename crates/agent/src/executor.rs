use std::sync::Arc;

use thiserror::Error;

use hrdesk_core::domain::employee::{
    default_account, Employee, EmployeeChanges, EmployeeCode, EmployeeDraft, EmployeeFilter,
    EmployeeId, EmployeeStatus, NewEmployee, EMPLOYEE_CODE_PREFIX,
};
use hrdesk_db::repositories::{EmployeeRepository, RepositoryError};

use crate::operation::{Operation, Outcome};

pub const DEFAULT_ACCOUNT_DOMAIN: &str = "company.com";

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Store(#[from] RepositoryError),
    #[error("employee {0} was not readable after a successful write")]
    MissingAfterWrite(EmployeeId),
}

/// Sole writer of employee records.
///
/// Lookups and writes are separate store calls, so two concurrent requests
/// may both pass the code-exists check. The store's unique code constraint
/// then rejects the second insert, which is reported as [`Outcome::Conflict`].
#[derive(Clone)]
pub struct OperationExecutor {
    repository: Arc<dyn EmployeeRepository>,
    account_domain: String,
}

impl OperationExecutor {
    pub fn new(repository: Arc<dyn EmployeeRepository>) -> Self {
        Self::with_account_domain(repository, DEFAULT_ACCOUNT_DOMAIN)
    }

    pub fn with_account_domain(
        repository: Arc<dyn EmployeeRepository>,
        account_domain: impl Into<String>,
    ) -> Self {
        Self { repository, account_domain: account_domain.into() }
    }

    pub fn repository(&self) -> &Arc<dyn EmployeeRepository> {
        &self.repository
    }

    pub async fn execute(&self, operation: Operation) -> Result<Outcome, ExecutionError> {
        match operation {
            Operation::QueryByName { name } => self.query_by_name(name).await,
            Operation::GetByCode { code } => self.get_by_code(code).await,
            Operation::CreateEmployee(request) => self.create(request).await,
            Operation::ModifyDepartment { name, new_department } => {
                self.modify_department(name, new_department).await
            }
            Operation::UpdateEmployee { name, changes } => self.update_by_name(name, changes).await,
            Operation::ListEmployees { department, status } => {
                let filter = EmployeeFilter { department, status, ..EmployeeFilter::default() }
                    .newest_first();
                Ok(Outcome::Listing(self.repository.query(&filter).await?))
            }
            Operation::ListDepartments => Ok(Outcome::Departments(
                self.repository.departments(Some(EmployeeStatus::Active)).await?,
            )),
            Operation::UpdateRecord { id, changes } => self.update_record(id, changes).await,
        }
    }

    async fn query_by_name(&self, name: String) -> Result<Outcome, ExecutionError> {
        let mut matches = self.repository.query(&EmployeeFilter::name_contains(name.as_str())).await?;
        Ok(match matches.len() {
            0 => Outcome::NotFound { query: name },
            1 => Outcome::Single(matches.remove(0)),
            _ => Outcome::Matches(matches),
        })
    }

    async fn get_by_code(&self, code: EmployeeCode) -> Result<Outcome, ExecutionError> {
        let mut matches = self.repository.query(&EmployeeFilter::code(code.clone())).await?;
        if matches.is_empty() {
            return Ok(Outcome::NotFound { query: code.0 });
        }
        Ok(Outcome::Single(matches.remove(0)))
    }

    async fn create(&self, request: NewEmployee) -> Result<Outcome, ExecutionError> {
        let code = match request.code {
            Some(code) => code,
            None => EmployeeCode::next_after(
                self.repository.max_code_sequence(EMPLOYEE_CODE_PREFIX).await?,
            ),
        };

        if !self.repository.query(&EmployeeFilter::code(code.clone())).await?.is_empty() {
            return Ok(self.conflict(code));
        }

        let account =
            request.account.unwrap_or_else(|| default_account(&request.name, &self.account_domain));
        let draft = EmployeeDraft {
            name: request.name,
            code,
            department: request.department,
            account,
            status: EmployeeStatus::Active,
        };

        let id = match self.repository.insert(&draft).await {
            Ok(id) => id,
            Err(RepositoryError::DuplicateCode(_)) => return Ok(self.conflict(draft.code)),
            Err(error) => return Err(error.into()),
        };
        let employee = self.reload(id).await?;

        tracing::info!(
            event_name = "agent.executor.employee_created",
            employee_code = %employee.code,
            department = %employee.department,
            "employee record created"
        );
        Ok(Outcome::Created(employee))
    }

    fn conflict(&self, code: EmployeeCode) -> Outcome {
        tracing::warn!(
            event_name = "agent.executor.code_conflict",
            employee_code = %code,
            "employee code already taken"
        );
        Outcome::Conflict { code }
    }

    async fn modify_department(
        &self,
        name: String,
        new_department: String,
    ) -> Result<Outcome, ExecutionError> {
        let employee = match self.unique_by_name(name).await? {
            Ok(employee) => employee,
            Err(outcome) => return Ok(outcome),
        };

        let previous_department = employee.department.clone();
        let changes = EmployeeChanges::department(new_department);
        if self.repository.update(employee.id, &changes).await? == 0 {
            return Ok(Outcome::NotFound { query: employee.name });
        }
        let employee = self.reload(employee.id).await?;

        tracing::info!(
            event_name = "agent.executor.department_changed",
            employee_code = %employee.code,
            previous_department = %previous_department,
            department = %employee.department,
            "employee department changed"
        );
        Ok(Outcome::DepartmentChanged { employee, previous_department })
    }

    async fn update_by_name(
        &self,
        name: String,
        changes: EmployeeChanges,
    ) -> Result<Outcome, ExecutionError> {
        if changes.is_empty() {
            return Ok(Outcome::NothingToUpdate);
        }

        let employee = match self.unique_by_name(name).await? {
            Ok(employee) => employee,
            Err(outcome) => return Ok(outcome),
        };

        self.update_record(employee.id, changes).await
    }

    async fn update_record(
        &self,
        id: EmployeeId,
        changes: EmployeeChanges,
    ) -> Result<Outcome, ExecutionError> {
        if changes.is_empty() {
            return Ok(Outcome::NothingToUpdate);
        }

        if self.repository.update(id, &changes).await? == 0 {
            return Ok(Outcome::NotFound { query: id.to_string() });
        }
        let employee = self.reload(id).await?;

        tracing::info!(
            event_name = "agent.executor.employee_updated",
            employee_code = %employee.code,
            status = %employee.status,
            "employee record updated"
        );
        Ok(Outcome::Updated(employee))
    }

    /// Exact-name lookup. The inner `Err` carries the not-found or ambiguous outcome.
    async fn unique_by_name(&self, name: String) -> Result<Result<Employee, Outcome>, ExecutionError> {
        let mut matches = self.repository.query(&EmployeeFilter::name_equals(name.as_str())).await?;
        Ok(match matches.len() {
            0 => Err(Outcome::NotFound { query: name }),
            1 => Ok(matches.remove(0)),
            count => {
                tracing::info!(
                    event_name = "agent.executor.ambiguous_name",
                    employee_name = %name,
                    candidates = count,
                    "name matches several employees; nothing changed"
                );
                Err(Outcome::Ambiguous { name, candidates: matches })
            }
        })
    }

    async fn reload(&self, id: EmployeeId) -> Result<Employee, ExecutionError> {
        self.repository.find_by_id(id).await?.ok_or(ExecutionError::MissingAfterWrite(id))
    }
}
