use hrdesk_core::domain::employee::{
    Employee, EmployeeChanges, EmployeeCode, EmployeeId, EmployeeStatus, NewEmployee,
};

/// Fully resolved request, consumed once by the executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Substring match on the name, name ascending.
    QueryByName { name: String },
    GetByCode { code: EmployeeCode },
    CreateEmployee(NewEmployee),
    /// Exact-name lookup; only the department changes.
    ModifyDepartment { name: String, new_department: String },
    /// Exact-name lookup applying any allow-listed field.
    UpdateEmployee { name: String, changes: EmployeeChanges },
    ListEmployees { department: Option<String>, status: Option<EmployeeStatus> },
    ListDepartments,
    UpdateRecord { id: EmployeeId, changes: EmployeeChanges },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueryByName { .. } => "query_by_name",
            Self::GetByCode { .. } => "get_by_code",
            Self::CreateEmployee(_) => "create_employee",
            Self::ModifyDepartment { .. } => "modify_department",
            Self::UpdateEmployee { .. } => "update_employee",
            Self::ListEmployees { .. } => "list_employees",
            Self::ListDepartments => "list_departments",
            Self::UpdateRecord { .. } => "update_record",
        }
    }
}

/// Normal results of an operation. Not-found, ambiguity and conflicts are
/// outcomes here, never errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    NotFound { query: String },
    Single(Employee),
    Matches(Vec<Employee>),
    Ambiguous { name: String, candidates: Vec<Employee> },
    Created(Employee),
    Conflict { code: EmployeeCode },
    DepartmentChanged { employee: Employee, previous_department: String },
    Updated(Employee),
    NothingToUpdate,
    Listing(Vec<Employee>),
    Departments(Vec<String>),
}

impl Outcome {
    /// Records carried by the outcome, in outcome order.
    pub fn employees(&self) -> Vec<&Employee> {
        match self {
            Self::Single(employee)
            | Self::Created(employee)
            | Self::Updated(employee)
            | Self::DepartmentChanged { employee, .. } => vec![employee],
            Self::Matches(employees)
            | Self::Listing(employees)
            | Self::Ambiguous { candidates: employees, .. } => employees.iter().collect(),
            Self::NotFound { .. }
            | Self::Conflict { .. }
            | Self::NothingToUpdate
            | Self::Departments(_) => Vec::new(),
        }
    }
}
