use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Prefix shared by every generated employee code (`EMP001`, `EMP002`, ...).
pub const EMPLOYEE_CODE_PREFIX: &str = "EMP";

/// Minimum digit width of a generated code sequence.
const CODE_SEQUENCE_WIDTH: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeCode(pub String);

impl EmployeeCode {
    /// Parses a caller-supplied code. Only `EMP` followed by digits is accepted.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if sequence_of(trimmed, EMPLOYEE_CODE_PREFIX).is_none() {
            return Err(DomainError::InvalidEmployeeCode(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn from_sequence(sequence: u32) -> Self {
        Self(format!("{EMPLOYEE_CODE_PREFIX}{sequence:0width$}", width = CODE_SEQUENCE_WIDTH))
    }

    /// Code following the highest sequence currently in use, `EMP001` when none exists.
    pub fn next_after(max_sequence: Option<u32>) -> Self {
        Self::from_sequence(max_sequence.map_or(1, |max| max.saturating_add(1)))
    }

    pub fn sequence(&self) -> Option<u32> {
        sequence_of(&self.0, EMPLOYEE_CODE_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric suffix of `code` when it is exactly `prefix` followed by one or more ASCII digits.
pub fn sequence_of(code: &str, prefix: &str) -> Option<u32> {
    let digits = code.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Departed,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Departed => "departed",
        }
    }

    /// Label used in human-facing replies.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "在职",
            Self::Departed => "离职",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "在职" => Ok(Self::Active),
            "departed" | "离职" => Ok(Self::Departed),
            _ => Err(DomainError::InvalidStatus(value.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    #[serde(rename = "employee_id")]
    pub code: EmployeeCode,
    pub department: String,
    pub account: String,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation request. Missing code and account are derived by the executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub department: String,
    pub code: Option<EmployeeCode>,
    pub account: Option<String>,
}

impl NewEmployee {
    pub fn new(name: impl Into<String>, department: impl Into<String>) -> Self {
        Self { name: name.into(), department: department.into(), code: None, account: None }
    }
}

/// Fully resolved row handed to the store on insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeDraft {
    pub name: String,
    pub code: EmployeeCode,
    pub department: String,
    pub account: String,
    pub status: EmployeeStatus,
}

/// Allow-listed field changes. `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub department: Option<String>,
    pub account: Option<String>,
    pub status: Option<EmployeeStatus>,
}

impl EmployeeChanges {
    pub fn department(department: impl Into<String>) -> Self {
        Self { department: Some(department.into()), ..Self::default() }
    }

    pub fn status(status: EmployeeStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.department.is_none()
            && self.account.is_none()
            && self.status.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmployeeOrder {
    #[default]
    NameAscending,
    NewestFirst,
}

/// Conjunctive record filter. Unset fields do not constrain the result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    /// Case-sensitive substring match on the name.
    pub name_contains: Option<String>,
    pub name_equals: Option<String>,
    pub code: Option<EmployeeCode>,
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub order: EmployeeOrder,
}

impl EmployeeFilter {
    pub fn name_contains(fragment: impl Into<String>) -> Self {
        Self { name_contains: Some(fragment.into()), ..Self::default() }
    }

    pub fn name_equals(name: impl Into<String>) -> Self {
        Self { name_equals: Some(name.into()), ..Self::default() }
    }

    pub fn code(code: EmployeeCode) -> Self {
        Self { code: Some(code), ..Self::default() }
    }

    pub fn newest_first(mut self) -> Self {
        self.order = EmployeeOrder::NewestFirst;
        self
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        self.name_contains.as_ref().map_or(true, |fragment| employee.name.contains(fragment.as_str()))
            && self.name_equals.as_ref().map_or(true, |name| &employee.name == name)
            && self.code.as_ref().map_or(true, |code| &employee.code == code)
            && self.department.as_ref().map_or(true, |department| &employee.department == department)
            && self.status.map_or(true, |status| employee.status == status)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentHeadcount {
    pub department: String,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmployeeStats {
    pub total_employees: i64,
    pub active_employees: i64,
    pub inactive_employees: i64,
    pub department_stats: Vec<DepartmentHeadcount>,
}

/// Account handle derived from the employee name when none is supplied.
pub fn default_account(name: &str, domain: &str) -> String {
    format!("{}@{domain}", name.trim().to_lowercase())
}
