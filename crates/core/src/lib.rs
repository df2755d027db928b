pub mod config;
pub mod domain;
pub mod errors;

pub use domain::employee::{
    default_account, DepartmentHeadcount, Employee, EmployeeChanges, EmployeeCode, EmployeeDraft,
    EmployeeFilter, EmployeeId, EmployeeOrder, EmployeeStats, EmployeeStatus, NewEmployee,
    EMPLOYEE_CODE_PREFIX,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
