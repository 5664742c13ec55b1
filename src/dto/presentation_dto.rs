use crate::models::question::QuestionDetails;
use crate::models::test::{Passage, SkillType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student-facing rendition of an approved test: answer keys and
/// justifications are gone, selectable options carry a fresh per-fetch
/// ordering, requirement templates are resolved against the running item
/// numbering, and media keys have been turned into retrievable references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentedTest {
    pub id: Uuid,
    pub name: String,
    pub skill: SkillType,
    pub total_items: usize,
    pub sections: Vec<PresentedSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentedSection {
    pub title: String,
    pub content: PresentedSectionContent,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub questions: Vec<PresentedQuestion>,
}

/// Listening transcripts stay server-side; students get the audio
/// reference only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresentedSectionContent {
    Reading { passages: Vec<Passage> },
    Listening { audio_url: String },
    Writing { task_prompt: String },
    Speaking { task_prompt: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentedQuestion {
    pub id: i32,
    /// Requirement text with `{start}`/`{end}` already resolved.
    pub requirement: String,
    pub number_start: usize,
    pub number_end: usize,
    #[serde(flatten)]
    pub details: QuestionDetails,
}
