use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Lifecycle of a human-evaluation request. Each state carries exactly the
/// data that state has: an assignment always names its teacher, a completed
/// evaluation always has feedback. There is no way to represent an assigned
/// evaluation without a teacher or to walk a state backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    Assigned {
        teacher_id: Uuid,
        assigned_at: DateTime<Utc>,
    },
    Completed {
        teacher_id: Uuid,
        assigned_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        feedback: JsonValue,
    },
}

impl EvaluationStatus {
    pub fn name(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Assigned { .. } => "assigned",
            EvaluationStatus::Completed { .. } => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, EvaluationStatus::Completed { .. })
    }
}

/// A student's request for qualitative teacher review of a writing or
/// speaking result. Mutated only through the workflow transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub student_id: Uuid,
    pub result_id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub status: EvaluationStatus,
}

impl Evaluation {
    pub fn assigned_teacher(&self) -> Option<Uuid> {
        match &self.status {
            EvaluationStatus::Pending => None,
            EvaluationStatus::Assigned { teacher_id, .. }
            | EvaluationStatus::Completed { teacher_id, .. } => Some(*teacher_id),
        }
    }
}
