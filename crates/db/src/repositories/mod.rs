use async_trait::async_trait;
use thiserror::Error;

use hrdesk_core::domain::employee::{
    Employee, EmployeeChanges, EmployeeDraft, EmployeeFilter, EmployeeId, EmployeeStats,
    EmployeeStatus,
};

pub mod employee;
pub mod memory;

pub use employee::SqlEmployeeRepository;
pub use memory::InMemoryEmployeeRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("employee code `{0}` already exists")]
    DuplicateCode(String),
}

/// Persistent collection of employee records.
///
/// Every read returns records in the order requested by the filter; writes
/// report how many rows they touched so callers can detect stale ids.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn query(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, RepositoryError>;

    async fn find_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError>;

    /// Inserts a fully resolved record. A taken code yields [`RepositoryError::DuplicateCode`].
    async fn insert(&self, draft: &EmployeeDraft) -> Result<EmployeeId, RepositoryError>;

    /// Applies the set fields and refreshes `updated_at`. Returns the affected row count.
    async fn update(
        &self,
        id: EmployeeId,
        changes: &EmployeeChanges,
    ) -> Result<u64, RepositoryError>;

    /// Highest numeric suffix among codes of the form `{prefix}<digits>`.
    async fn max_code_sequence(&self, prefix: &str) -> Result<Option<u32>, RepositoryError>;

    /// Distinct departments, ascending, optionally restricted to one status.
    async fn departments(
        &self,
        status: Option<EmployeeStatus>,
    ) -> Result<Vec<String>, RepositoryError>;

    async fn stats(&self) -> Result<EmployeeStats, RepositoryError>;
}
