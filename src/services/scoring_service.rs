use crate::error::{Error, Result};
use crate::models::question::{MatchPolicy, Question, QuestionKind};
use std::collections::{BTreeMap, HashMap};

/// Comparison strategy between a submitted value and an answer key value.
pub trait AnswerMatcher {
    fn matches(&self, expected: &str, submitted: &str) -> bool;
}

/// Byte-equality, no normalization.
pub struct ExactMatcher;

impl AnswerMatcher for ExactMatcher {
    fn matches(&self, expected: &str, submitted: &str) -> bool {
        expected == submitted
    }
}

/// Trimmed, case-insensitive equality for free natural-language input.
pub struct LenientMatcher;

impl AnswerMatcher for LenientMatcher {
    fn matches(&self, expected: &str, submitted: &str) -> bool {
        submitted.trim().to_lowercase() == expected.trim().to_lowercase()
    }
}

pub fn matcher_for(kind: QuestionKind) -> &'static dyn AnswerMatcher {
    match kind.match_policy() {
        MatchPolicy::Exact => &ExactMatcher,
        MatchPolicy::Lenient => &LenientMatcher,
    }
}

#[derive(Debug, Clone)]
pub struct QuestionScore {
    /// Item id → correctness, for every gradable item of the question.
    pub per_item: BTreeMap<String, bool>,
    pub item_count: usize,
}

impl QuestionScore {
    pub fn correct_count(&self) -> u32 {
        self.per_item.values().filter(|c| **c).count() as u32
    }
}

/// The question-type registry: given a question and the student's submitted
/// values, decides per-item correctness. Correctness reads stable ids only,
/// never display positions.
pub struct ScoringService;

impl ScoringService {
    pub fn score_question(
        question: &Question,
        submitted: &HashMap<String, String>,
    ) -> Result<QuestionScore> {
        let item_ids = question.details.item_ids();
        let matcher = matcher_for(question.kind());

        let mut per_item = BTreeMap::new();
        for item_id in &item_ids {
            let entry = question.key_for(item_id).ok_or_else(|| {
                Error::Scoring(format!(
                    "question {} ({}) is missing the answer key for item '{}'",
                    question.id,
                    question.kind(),
                    item_id
                ))
            })?;
            let correct = submitted
                .get(item_id)
                .map(|value| matcher.matches(&entry.value, value))
                .unwrap_or(false);
            per_item.insert(item_id.clone(), correct);
        }

        Ok(QuestionScore {
            per_item,
            item_count: item_ids.len(),
        })
    }
}
