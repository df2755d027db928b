use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{QueryBuilder, Row, Sqlite};

use hrdesk_core::domain::employee::{
    sequence_of, DepartmentHeadcount, Employee, EmployeeChanges, EmployeeCode, EmployeeDraft,
    EmployeeFilter, EmployeeId, EmployeeOrder, EmployeeStats, EmployeeStatus,
};

use super::{EmployeeRepository, RepositoryError};
use crate::DbPool;

const EMPLOYEE_COLUMNS: &str =
    "SELECT id, name, employee_code, department, account, status, created_at, updated_at FROM employee";

pub struct SqlEmployeeRepository {
    pool: DbPool,
}

impl SqlEmployeeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Fixed-width RFC 3339 text so lexical order matches chronological order.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}

fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Result<Employee, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let code: String =
        row.try_get("employee_code").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let department: String =
        row.try_get("department").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let account: String =
        row.try_get("account").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = status_str
        .parse::<EmployeeStatus>()
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Employee {
        id: EmployeeId(id),
        name,
        code: EmployeeCode(code),
        department,
        account,
        status,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &EmployeeFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(fragment) = &filter.name_contains {
        // instr keeps the match case-sensitive, unlike LIKE.
        builder.push(" AND instr(name, ").push_bind(fragment.clone()).push(") > 0");
    }
    if let Some(name) = &filter.name_equals {
        builder.push(" AND name = ").push_bind(name.clone());
    }
    if let Some(code) = &filter.code {
        builder.push(" AND employee_code = ").push_bind(code.0.clone());
    }
    if let Some(department) = &filter.department {
        builder.push(" AND department = ").push_bind(department.clone());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    match filter.order {
        EmployeeOrder::NameAscending => builder.push(" ORDER BY name ASC, id ASC"),
        EmployeeOrder::NewestFirst => builder.push(" ORDER BY created_at DESC, id DESC"),
    };
}

#[async_trait::async_trait]
impl EmployeeRepository for SqlEmployeeRepository {
    async fn query(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(EMPLOYEE_COLUMNS);
        push_filter(&mut builder, filter);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_employee).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let row = sqlx::query(&format!("{EMPLOYEE_COLUMNS} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_employee(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, draft: &EmployeeDraft) -> Result<EmployeeId, RepositoryError> {
        let now = now_timestamp();

        let result = sqlx::query(
            "INSERT INTO employee (name, employee_code, department, account, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&draft.name)
        .bind(&draft.code.0)
        .bind(&draft.department)
        .bind(&draft.account)
        .bind(draft.status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            let duplicate =
                error.as_database_error().is_some_and(|db| db.is_unique_violation());
            if duplicate {
                RepositoryError::DuplicateCode(draft.code.0.clone())
            } else {
                RepositoryError::Database(error)
            }
        })?;

        Ok(EmployeeId(result.last_insert_rowid()))
    }

    async fn update(
        &self,
        id: EmployeeId,
        changes: &EmployeeChanges,
    ) -> Result<u64, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE employee SET updated_at = ");
        builder.push_bind(now_timestamp());
        if let Some(name) = &changes.name {
            builder.push(", name = ").push_bind(name.clone());
        }
        if let Some(department) = &changes.department {
            builder.push(", department = ").push_bind(department.clone());
        }
        if let Some(account) = &changes.account {
            builder.push(", account = ").push_bind(account.clone());
        }
        if let Some(status) = changes.status {
            builder.push(", status = ").push_bind(status.as_str());
        }
        builder.push(" WHERE id = ").push_bind(id.0);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn max_code_sequence(&self, prefix: &str) -> Result<Option<u32>, RepositoryError> {
        let codes: Vec<String> = sqlx::query_scalar(
            "SELECT employee_code FROM employee WHERE substr(employee_code, 1, length(?1)) = ?1",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(codes.iter().filter_map(|code| sequence_of(code, prefix)).max())
    }

    async fn departments(
        &self,
        status: Option<EmployeeStatus>,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT DISTINCT department FROM employee");
        if let Some(status) = status {
            builder.push(" WHERE status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY department ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("department")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn stats(&self) -> Result<EmployeeStats, RepositoryError> {
        let totals = sqlx::query(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS active,
                    COALESCE(SUM(CASE WHEN status = 'departed' THEN 1 ELSE 0 END), 0) AS departed
             FROM employee",
        )
        .fetch_one(&self.pool)
        .await?;

        let total_employees: i64 =
            totals.try_get("total").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let active_employees: i64 =
            totals.try_get("active").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let inactive_employees: i64 =
            totals.try_get("departed").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let rows = sqlx::query(
            "SELECT department, COUNT(*) AS count
             FROM employee
             WHERE status = 'active'
             GROUP BY department
             ORDER BY count DESC, department ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let department_stats = rows
            .iter()
            .map(|row| {
                Ok(DepartmentHeadcount {
                    department: row
                        .try_get("department")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    count: row.try_get("count").map_err(|e| RepositoryError::Decode(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(EmployeeStats { total_employees, active_employees, inactive_employees, department_stats })
    }
}

#[cfg(test)]
mod tests {
    use hrdesk_core::domain::employee::{
        EmployeeChanges, EmployeeCode, EmployeeDraft, EmployeeFilter, EmployeeId, EmployeeStatus,
    };

    use super::SqlEmployeeRepository;
    use crate::repositories::{EmployeeRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlEmployeeRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlEmployeeRepository::new(pool)
    }

    fn draft(name: &str, code: &str, department: &str, status: EmployeeStatus) -> EmployeeDraft {
        EmployeeDraft {
            name: name.to_string(),
            code: EmployeeCode(code.to_string()),
            department: department.to_string(),
            account: format!("{code}@company.com").to_lowercase(),
            status,
        }
    }

    #[tokio::test]
    async fn insert_and_find_by_id() {
        let repo = setup().await;

        let id = repo
            .insert(&draft("张三", "EMP001", "技术部", EmployeeStatus::Active))
            .await
            .expect("insert");
        let found = repo.find_by_id(id).await.expect("find").expect("should exist");

        assert_eq!(found.name, "张三");
        assert_eq!(found.code.as_str(), "EMP001");
        assert_eq!(found.status, EmployeeStatus::Active);
        assert_eq!(found.created_at, found.updated_at);
        assert!(repo.find_by_id(EmployeeId(999)).await.expect("find missing").is_none());
    }

    #[tokio::test]
    async fn name_contains_is_case_sensitive_substring() {
        let repo = setup().await;
        repo.insert(&draft("张三", "EMP001", "技术部", EmployeeStatus::Active)).await.expect("1");
        repo.insert(&draft("张三丰", "EMP002", "市场部", EmployeeStatus::Active)).await.expect("2");
        repo.insert(&draft("Alice", "EMP003", "人事部", EmployeeStatus::Active)).await.expect("3");

        let zhang = repo.query(&EmployeeFilter::name_contains("张三")).await.expect("query");
        assert_eq!(zhang.len(), 2);

        let lower = repo.query(&EmployeeFilter::name_contains("alice")).await.expect("query");
        assert!(lower.is_empty());

        let exact = repo.query(&EmployeeFilter::name_equals("张三")).await.expect("query");
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].code.as_str(), "EMP001");
    }

    #[tokio::test]
    async fn newest_first_orders_by_creation_then_id() {
        let repo = setup().await;
        repo.insert(&draft("甲", "EMP001", "技术部", EmployeeStatus::Active)).await.expect("1");
        repo.insert(&draft("乙", "EMP002", "技术部", EmployeeStatus::Active)).await.expect("2");

        let listed = repo.query(&EmployeeFilter::default().newest_first()).await.expect("query");
        let codes = listed.iter().map(|e| e.code.as_str()).collect::<Vec<_>>();
        assert_eq!(codes, vec!["EMP002", "EMP001"]);
    }

    #[tokio::test]
    async fn duplicate_code_is_reported_distinctly() {
        let repo = setup().await;
        repo.insert(&draft("张三", "EMP001", "技术部", EmployeeStatus::Active)).await.expect("1");

        let error = repo
            .insert(&draft("李四", "EMP001", "市场部", EmployeeStatus::Active))
            .await
            .expect_err("duplicate should fail");
        assert!(matches!(error, RepositoryError::DuplicateCode(ref code) if code == "EMP001"));
    }

    #[tokio::test]
    async fn update_touches_only_set_fields() {
        let repo = setup().await;
        let id = repo
            .insert(&draft("李四", "EMP002", "市场部", EmployeeStatus::Active))
            .await
            .expect("insert");
        let before = repo.find_by_id(id).await.expect("find").expect("exists");

        let affected =
            repo.update(id, &EmployeeChanges::department("行政部")).await.expect("update");
        assert_eq!(affected, 1);

        let after = repo.find_by_id(id).await.expect("find").expect("exists");
        assert_eq!(after.department, "行政部");
        assert_eq!(after.name, before.name);
        assert_eq!(after.account, before.account);
        assert!(after.updated_at >= before.updated_at);

        let missing = repo
            .update(EmployeeId(404), &EmployeeChanges::status(EmployeeStatus::Departed))
            .await
            .expect("update missing");
        assert_eq!(missing, 0);
    }

    #[tokio::test]
    async fn max_code_sequence_ignores_foreign_codes() {
        let repo = setup().await;
        assert_eq!(repo.max_code_sequence("EMP").await.expect("empty"), None);

        repo.insert(&draft("甲", "EMP002", "技术部", EmployeeStatus::Active)).await.expect("1");
        repo.insert(&draft("乙", "EMP010", "技术部", EmployeeStatus::Active)).await.expect("2");
        repo.insert(&draft("丙", "CTR999", "技术部", EmployeeStatus::Active)).await.expect("3");
        repo.insert(&draft("丁", "EMP0x1", "技术部", EmployeeStatus::Active)).await.expect("4");

        assert_eq!(repo.max_code_sequence("EMP").await.expect("max"), Some(10));
    }

    #[tokio::test]
    async fn departments_and_stats_count_active_headcount() {
        let repo = setup().await;
        repo.insert(&draft("张三", "EMP001", "技术部", EmployeeStatus::Active)).await.expect("1");
        repo.insert(&draft("李四", "EMP002", "市场部", EmployeeStatus::Active)).await.expect("2");
        repo.insert(&draft("赵六", "EMP003", "财务部", EmployeeStatus::Departed)).await.expect("3");
        repo.insert(&draft("孙七", "EMP004", "技术部", EmployeeStatus::Active)).await.expect("4");

        let active = repo.departments(Some(EmployeeStatus::Active)).await.expect("departments");
        assert_eq!(active, vec!["市场部".to_string(), "技术部".to_string()]);

        let all = repo.departments(None).await.expect("all departments");
        assert_eq!(all.len(), 3);

        let stats = repo.stats().await.expect("stats");
        assert_eq!(stats.total_employees, 4);
        assert_eq!(stats.active_employees, 3);
        assert_eq!(stats.inactive_employees, 1);
        assert_eq!(stats.department_stats[0].department, "技术部");
        assert_eq!(stats.department_stats[0].count, 2);
        assert_eq!(stats.department_stats.len(), 2);
    }
}
