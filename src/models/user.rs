use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role flags issued by the identity collaborator. The engine trusts them
/// as-is and performs no credential checks of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Teacher,
    Student,
}

/// An already-verified caller, as handed down by the authentication layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// Teachers and administrators share the authoring surface.
    pub fn can_author(&self) -> bool {
        matches!(self.role, Role::Administrator | Role::Teacher)
    }
}
