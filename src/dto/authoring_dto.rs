use crate::models::question::{AnswerKeyEntry, QuestionDetails};
use crate::models::test::{SectionContent, SkillType};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTestPayload {
    #[validate(length(min = 1, message = "Test name must not be empty"))]
    pub name: String,
    pub skill: SkillType,
    #[validate(length(min = 1, message = "A test needs at least one section"))]
    pub sections: Vec<CreateSectionPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSectionPayload {
    pub title: String,
    pub content: SectionContent,
    #[serde(default)]
    pub image_keys: Vec<String>,
    #[serde(default)]
    pub questions: Vec<CreateQuestionPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionPayload {
    pub requirement: String,
    #[serde(flatten)]
    pub details: QuestionDetails,
    pub answer_key: Vec<AnswerKeyEntry>,
}

/// Rename-only update surface. The skill type deliberately has no field
/// here: every question kind and section shape depends on it, so it is
/// fixed at creation.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTestPayload {
    // Using serde deserializer to trim and convert empty strings to None
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub name: Option<String>,
}

// Custom deserializer to trim strings and convert empty strings to None
fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
