use crate::models::test::SkillType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

/// Question id → item id → submitted value.
pub type AnswerMap = HashMap<i32, HashMap<String, String>>;

/// One completed attempt, owned by the student. Objective results carry the
/// engine's own score/total; subjective results carry whatever band and
/// feedback the external grading collaborator returned, and may later gain a
/// human evaluation through the workflow.
///
/// Name and skill are denormalized from the test so the result stays
/// readable after the test itself is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub test_id: Uuid,
    pub student_id: Uuid,
    pub test_name: String,
    pub skill: SkillType,
    pub score: u32,
    pub total: u32,
    pub band: Option<f32>,
    pub feedback: Option<JsonValue>,
    pub answers: AnswerMap,
    pub essay_text: Option<String>,
    #[serde(default)]
    pub recording_keys: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

impl TestResult {
    /// Writing and speaking results are the only ones a human evaluation
    /// can be requested for.
    pub fn eligible_for_evaluation(&self) -> bool {
        self.skill.is_subjective()
    }
}
