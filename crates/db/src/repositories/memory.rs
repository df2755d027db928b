use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tokio::sync::RwLock;

use hrdesk_core::domain::employee::{
    sequence_of, DepartmentHeadcount, Employee, EmployeeChanges, EmployeeDraft, EmployeeFilter,
    EmployeeId, EmployeeOrder, EmployeeStats, EmployeeStatus,
};

use super::{EmployeeRepository, RepositoryError};

#[derive(Default)]
struct EmployeeTable {
    rows: BTreeMap<i64, Employee>,
    last_id: i64,
}

/// Process-local store with the same observable semantics as the SQL repository.
#[derive(Default)]
pub struct InMemoryEmployeeRepository {
    table: RwLock<EmployeeTable>,
}

impl InMemoryEmployeeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn query(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, RepositoryError> {
        let table = self.table.read().await;
        let mut matched =
            table.rows.values().filter(|employee| filter.matches(employee)).cloned().collect::<Vec<_>>();

        match filter.order {
            EmployeeOrder::NameAscending => {
                matched.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
            }
            EmployeeOrder::NewestFirst => {
                matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
        }

        Ok(matched)
    }

    async fn find_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id.0).cloned())
    }

    async fn insert(&self, draft: &EmployeeDraft) -> Result<EmployeeId, RepositoryError> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|employee| employee.code == draft.code) {
            return Err(RepositoryError::DuplicateCode(draft.code.0.clone()));
        }

        table.last_id += 1;
        let id = EmployeeId(table.last_id);
        let now = Utc::now();
        table.rows.insert(
            id.0,
            Employee {
                id,
                name: draft.name.clone(),
                code: draft.code.clone(),
                department: draft.department.clone(),
                account: draft.account.clone(),
                status: draft.status,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(id)
    }

    async fn update(
        &self,
        id: EmployeeId,
        changes: &EmployeeChanges,
    ) -> Result<u64, RepositoryError> {
        let mut table = self.table.write().await;
        let Some(employee) = table.rows.get_mut(&id.0) else {
            return Ok(0);
        };

        if let Some(name) = &changes.name {
            employee.name = name.clone();
        }
        if let Some(department) = &changes.department {
            employee.department = department.clone();
        }
        if let Some(account) = &changes.account {
            employee.account = account.clone();
        }
        if let Some(status) = changes.status {
            employee.status = status;
        }
        employee.updated_at = Utc::now();

        Ok(1)
    }

    async fn max_code_sequence(&self, prefix: &str) -> Result<Option<u32>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter_map(|employee| sequence_of(employee.code.as_str(), prefix)).max())
    }

    async fn departments(
        &self,
        status: Option<EmployeeStatus>,
    ) -> Result<Vec<String>, RepositoryError> {
        let table = self.table.read().await;
        let departments = table
            .rows
            .values()
            .filter(|employee| status.map_or(true, |status| employee.status == status))
            .map(|employee| employee.department.clone())
            .collect::<BTreeSet<_>>();
        Ok(departments.into_iter().collect())
    }

    async fn stats(&self) -> Result<EmployeeStats, RepositoryError> {
        let table = self.table.read().await;
        let total_employees = table.rows.len() as i64;
        let active_employees =
            table.rows.values().filter(|employee| employee.status == EmployeeStatus::Active).count()
                as i64;

        let mut headcount = BTreeMap::<String, i64>::new();
        for employee in table.rows.values().filter(|e| e.status == EmployeeStatus::Active) {
            *headcount.entry(employee.department.clone()).or_default() += 1;
        }
        let mut department_stats = headcount
            .into_iter()
            .map(|(department, count)| DepartmentHeadcount { department, count })
            .collect::<Vec<_>>();
        department_stats.sort_by(|a, b| b.count.cmp(&a.count).then(a.department.cmp(&b.department)));

        Ok(EmployeeStats {
            total_employees,
            active_employees,
            inactive_employees: total_employees - active_employees,
            department_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use hrdesk_core::domain::employee::{
        EmployeeChanges, EmployeeCode, EmployeeDraft, EmployeeFilter, EmployeeStatus,
    };

    use super::InMemoryEmployeeRepository;
    use crate::repositories::{EmployeeRepository, RepositoryError};

    fn draft(name: &str, code: &str, department: &str) -> EmployeeDraft {
        EmployeeDraft {
            name: name.to_string(),
            code: EmployeeCode(code.to_string()),
            department: department.to_string(),
            account: format!("{}@company.com", code.to_lowercase()),
            status: EmployeeStatus::Active,
        }
    }

    #[tokio::test]
    async fn in_memory_repository_round_trip() {
        let repo = InMemoryEmployeeRepository::new();
        let id = repo.insert(&draft("王五", "EMP003", "人事部")).await.expect("insert");

        let found = repo.find_by_id(id).await.expect("find").expect("exists");
        assert_eq!(found.name, "王五");
        assert_eq!(repo.max_code_sequence("EMP").await.expect("max"), Some(3));
    }

    #[tokio::test]
    async fn in_memory_repository_rejects_duplicate_codes() {
        let repo = InMemoryEmployeeRepository::new();
        repo.insert(&draft("王五", "EMP003", "人事部")).await.expect("insert");

        let error = repo.insert(&draft("赵六", "EMP003", "财务部")).await.expect_err("duplicate");
        assert!(matches!(error, RepositoryError::DuplicateCode(_)));
    }

    #[tokio::test]
    async fn in_memory_update_and_filter_by_status() {
        let repo = InMemoryEmployeeRepository::new();
        let id = repo.insert(&draft("赵六", "EMP004", "财务部")).await.expect("insert");
        repo.insert(&draft("孙七", "EMP005", "技术部")).await.expect("insert");

        let affected = repo
            .update(id, &EmployeeChanges::status(EmployeeStatus::Departed))
            .await
            .expect("update");
        assert_eq!(affected, 1);

        let departed = repo
            .query(&EmployeeFilter { status: Some(EmployeeStatus::Departed), ..EmployeeFilter::default() })
            .await
            .expect("query");
        assert_eq!(departed.len(), 1);
        assert_eq!(departed[0].name, "赵六");

        let active_departments =
            repo.departments(Some(EmployeeStatus::Active)).await.expect("departments");
        assert_eq!(active_departments, vec!["技术部".to_string()]);

        let stats = repo.stats().await.expect("stats");
        assert_eq!(stats.inactive_employees, 1);
    }
}
