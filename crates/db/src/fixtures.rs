use sqlx::Executor;

use hrdesk_core::domain::employee::{EmployeeCode, EmployeeDraft, EmployeeStatus};

use crate::connection::DbPool;
use crate::repositories::{EmployeeRepository, RepositoryError};

/// Five-person starter roster. One employee has already departed.
const ROSTER: &[RosterEntry] = &[
    RosterEntry {
        name: "张三",
        code: "EMP001",
        department: "技术部",
        account: "zhangsan@company.com",
        status: EmployeeStatus::Active,
    },
    RosterEntry {
        name: "李四",
        code: "EMP002",
        department: "市场部",
        account: "lisi@company.com",
        status: EmployeeStatus::Active,
    },
    RosterEntry {
        name: "王五",
        code: "EMP003",
        department: "人事部",
        account: "wangwu@company.com",
        status: EmployeeStatus::Active,
    },
    RosterEntry {
        name: "赵六",
        code: "EMP004",
        department: "财务部",
        account: "zhaoliu@company.com",
        status: EmployeeStatus::Departed,
    },
    RosterEntry {
        name: "孙七",
        code: "EMP005",
        department: "技术部",
        account: "sunqi@company.com",
        status: EmployeeStatus::Active,
    },
];

pub struct SampleRoster;

impl SampleRoster {
    /// SQL fixture content for the starter roster.
    pub const SQL: &str = include_str!("../../../config/fixtures/sample_roster.sql");

    /// Loads the roster unless the employee table already holds records.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM employee").fetch_one(pool).await?;
        if existing > 0 {
            return Ok(SeedResult { seeded: Vec::new(), skipped_existing: existing });
        }

        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult { seeded: ROSTER.iter().map(|entry| entry.code).collect(), skipped_existing: 0 })
    }

    /// Same roster for repositories without a SQL backend.
    pub async fn load_into(
        repository: &dyn EmployeeRepository,
    ) -> Result<SeedResult, RepositoryError> {
        let stats = repository.stats().await?;
        if stats.total_employees > 0 {
            return Ok(SeedResult { seeded: Vec::new(), skipped_existing: stats.total_employees });
        }

        for draft in Self::drafts() {
            repository.insert(&draft).await?;
        }

        Ok(SeedResult { seeded: ROSTER.iter().map(|entry| entry.code).collect(), skipped_existing: 0 })
    }

    pub fn drafts() -> Vec<EmployeeDraft> {
        ROSTER
            .iter()
            .map(|entry| EmployeeDraft {
                name: entry.name.to_string(),
                code: EmployeeCode(entry.code.to_string()),
                department: entry.department.to_string(),
                account: entry.account.to_string(),
                status: entry.status,
            })
            .collect()
    }

    /// Checks that every roster record is present with its seeded values.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(ROSTER.len());

        for entry in ROSTER {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM employee
                     WHERE employee_code = ?1 AND name = ?2 AND department = ?3
                       AND account = ?4 AND status = ?5
                 )",
            )
            .bind(entry.code)
            .bind(entry.name)
            .bind(entry.department)
            .bind(entry.account)
            .bind(entry.status.as_str())
            .fetch_one(pool)
            .await?;
            checks.push((entry.code, present == 1));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug, Clone, Copy)]
struct RosterEntry {
    name: &'static str,
    code: &'static str,
    department: &'static str,
    account: &'static str,
    status: EmployeeStatus,
}

#[derive(Debug)]
pub struct SeedResult {
    pub seeded: Vec<&'static str>,
    /// Record count that caused seeding to be skipped, zero when seeding ran.
    pub skipped_existing: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
