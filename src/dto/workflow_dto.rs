use crate::models::test::SkillType;
use crate::models::test_result::{AnswerMap, TestResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

/// One completed attempt as submitted by the student. Objective skills fill
/// `answers`; writing sends `essay_text`; speaking sends `recording_keys`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SubmitTestRequest {
    #[serde(default)]
    pub answers: AnswerMap,
    pub essay_text: Option<String>,
    #[serde(default)]
    pub recording_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultSummary {
    pub id: Uuid,
    pub test_id: Uuid,
    pub test_name: String,
    pub skill: SkillType,
    pub score: u32,
    pub total: u32,
    pub band: Option<f32>,
    pub submitted_at: DateTime<Utc>,
}

impl From<&TestResult> for TestResultSummary {
    fn from(result: &TestResult) -> Self {
        Self {
            id: result.id,
            test_id: result.test_id,
            test_name: result.test_name.clone(),
            skill: result.skill,
            score: result.score,
            total: result.total,
            band: result.band,
            submitted_at: result.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompleteEvaluationPayload {
    pub feedback: JsonValue,
}
