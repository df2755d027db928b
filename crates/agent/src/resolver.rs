use std::fmt;

use hrdesk_core::domain::employee::NewEmployee;

use crate::conversation::{ExtractedEntities, Intent};
use crate::operation::Operation;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClarificationReason {
    MissingName,
    MissingNameOrDepartment { intent: Intent },
    IntentNotRecognized,
}

impl ClarificationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingName => "name required",
            Self::MissingNameOrDepartment { .. } => "name and department required",
            Self::IntentNotRecognized => "intent not recognized",
        }
    }
}

impl fmt::Display for ClarificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClarificationNeeded {
    pub reason: ClarificationReason,
}

/// Pure mapping from classified text to an operation. Never touches the store.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperationResolver;

impl OperationResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(
        &self,
        intent: Intent,
        entities: &ExtractedEntities,
    ) -> Result<Operation, ClarificationNeeded> {
        let name = present(&entities.person_name);
        let department = present(&entities.department);

        match intent {
            Intent::Query => name
                .map(|name| Operation::QueryByName { name: name.to_string() })
                .ok_or(ClarificationNeeded { reason: ClarificationReason::MissingName }),
            Intent::Create => match (name, department) {
                (Some(name), Some(department)) => {
                    Ok(Operation::CreateEmployee(NewEmployee::new(name, department)))
                }
                _ => Err(ClarificationNeeded {
                    reason: ClarificationReason::MissingNameOrDepartment { intent },
                }),
            },
            Intent::Modify => match (name, department) {
                (Some(name), Some(department)) => Ok(Operation::ModifyDepartment {
                    name: name.to_string(),
                    new_department: department.to_string(),
                }),
                _ => Err(ClarificationNeeded {
                    reason: ClarificationReason::MissingNameOrDepartment { intent },
                }),
            },
            Intent::Unknown => {
                Err(ClarificationNeeded { reason: ClarificationReason::IntentNotRecognized })
            }
        }
    }
}

fn present(slot: &Option<String>) -> Option<&str> {
    slot.as_deref().map(str::trim).filter(|value| !value.is_empty())
}
