use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Marker for a gradable blank inside a `summary_completion` template.
pub const BLANK_MARKER: &str = "_____";

/// A selectable option (heading, sentence ending, feature, MCQ option).
/// The id is the stable identifier submitted as the answer value; display
/// order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

/// One gradable sub-unit of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub id: String,
    pub prompt: String,
}

/// A multiple-choice item carries its own option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqItem {
    pub id: String,
    pub prompt: String,
    pub options: Vec<Choice>,
}

/// The correct value for one item id, with optional justification text
/// pointing back at the source passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    pub item_id: String,
    pub value: String,
    pub justification: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MatchingHeading,
    MatchingParagraphInformation,
    MatchingSentenceEndings,
    MatchingFeatures,
    MultipleChoice,
    TrueFalseNotGiven,
    YesNoNotGiven,
    ShortAnswer,
    SummaryCompletion,
    TableCompletion,
    DiagramCompletion,
}

/// How a submitted value is compared against the answer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Byte-equality. Option ids, passage labels and TRUE/FALSE/NOT GIVEN
    /// verdicts are controlled vocabularies, so no normalization applies.
    Exact,
    /// Trimmed, case-insensitive equality for free natural-language input.
    Lenient,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MatchingHeading => "matching_heading",
            QuestionKind::MatchingParagraphInformation => "matching_paragraph_information",
            QuestionKind::MatchingSentenceEndings => "matching_sentence_endings",
            QuestionKind::MatchingFeatures => "matching_features",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalseNotGiven => "true_false_not_given",
            QuestionKind::YesNoNotGiven => "yes_no_not_given",
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::SummaryCompletion => "summary_completion",
            QuestionKind::TableCompletion => "table_completion",
            QuestionKind::DiagramCompletion => "diagram_completion",
        }
    }

    pub fn match_policy(&self) -> MatchPolicy {
        match self {
            QuestionKind::ShortAnswer | QuestionKind::SummaryCompletion => MatchPolicy::Lenient,
            _ => MatchPolicy::Exact,
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific question payload. One case per kind, holding only the
/// fields that kind actually has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionDetails {
    MatchingHeading {
        items: Vec<QuestionItem>,
        headings: Vec<Choice>,
    },
    /// Answers are section passage labels ("A", "B", ...), so no embedded
    /// option list.
    MatchingParagraphInformation { items: Vec<QuestionItem> },
    MatchingSentenceEndings {
        items: Vec<QuestionItem>,
        endings: Vec<Choice>,
    },
    MatchingFeatures {
        items: Vec<QuestionItem>,
        features: Vec<Choice>,
    },
    MultipleChoice { items: Vec<McqItem> },
    TrueFalseNotGiven { items: Vec<QuestionItem> },
    YesNoNotGiven { items: Vec<QuestionItem> },
    ShortAnswer {
        items: Vec<QuestionItem>,
        word_limit: Option<u32>,
    },
    /// Items are derived from the blank markers in the template; their ids
    /// are the 1-based blank positions.
    SummaryCompletion { summary: String },
    TableCompletion {
        columns: Vec<String>,
        items: Vec<QuestionItem>,
    },
    DiagramCompletion {
        image_key: Option<String>,
        items: Vec<QuestionItem>,
    },
}

pub fn count_blanks(template: &str) -> usize {
    template.matches(BLANK_MARKER).count()
}

impl QuestionDetails {
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionDetails::MatchingHeading { .. } => QuestionKind::MatchingHeading,
            QuestionDetails::MatchingParagraphInformation { .. } => {
                QuestionKind::MatchingParagraphInformation
            }
            QuestionDetails::MatchingSentenceEndings { .. } => {
                QuestionKind::MatchingSentenceEndings
            }
            QuestionDetails::MatchingFeatures { .. } => QuestionKind::MatchingFeatures,
            QuestionDetails::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            QuestionDetails::TrueFalseNotGiven { .. } => QuestionKind::TrueFalseNotGiven,
            QuestionDetails::YesNoNotGiven { .. } => QuestionKind::YesNoNotGiven,
            QuestionDetails::ShortAnswer { .. } => QuestionKind::ShortAnswer,
            QuestionDetails::SummaryCompletion { .. } => QuestionKind::SummaryCompletion,
            QuestionDetails::TableCompletion { .. } => QuestionKind::TableCompletion,
            QuestionDetails::DiagramCompletion { .. } => QuestionKind::DiagramCompletion,
        }
    }

    /// Stable ids of every gradable item, in authored order.
    pub fn item_ids(&self) -> Vec<String> {
        match self {
            QuestionDetails::MultipleChoice { items } => {
                items.iter().map(|i| i.id.clone()).collect()
            }
            QuestionDetails::SummaryCompletion { summary } => {
                (1..=count_blanks(summary)).map(|n| n.to_string()).collect()
            }
            QuestionDetails::MatchingHeading { items, .. }
            | QuestionDetails::MatchingParagraphInformation { items }
            | QuestionDetails::MatchingSentenceEndings { items, .. }
            | QuestionDetails::MatchingFeatures { items, .. }
            | QuestionDetails::TrueFalseNotGiven { items }
            | QuestionDetails::YesNoNotGiven { items }
            | QuestionDetails::ShortAnswer { items, .. }
            | QuestionDetails::TableCompletion { items, .. }
            | QuestionDetails::DiagramCompletion { items, .. } => {
                items.iter().map(|i| i.id.clone()).collect()
            }
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            QuestionDetails::SummaryCompletion { summary } => count_blanks(summary),
            QuestionDetails::MultipleChoice { items } => items.len(),
            _ => self.item_ids().len(),
        }
    }
}

/// A question inside a section. `retired_item_ids` records every item id
/// that has been deleted over the question's lifetime; the edit API refuses
/// to let those ids come back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i32,
    pub requirement: String,
    #[serde(flatten)]
    pub details: QuestionDetails,
    pub answer_key: Vec<AnswerKeyEntry>,
    #[serde(default)]
    pub retired_item_ids: Vec<String>,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        self.details.kind()
    }

    pub fn key_for(&self, item_id: &str) -> Option<&AnswerKeyEntry> {
        self.answer_key.iter().find(|e| e.item_id == item_id)
    }

    /// Structural validation, run before anything is persisted.
    pub fn validate(&self) -> Result<()> {
        let item_ids = self.details.item_ids();

        let mut seen = BTreeSet::new();
        for id in &item_ids {
            if id.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "question {}: empty item id",
                    self.id
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(Error::Validation(format!(
                    "question {}: duplicate item id '{}'",
                    self.id, id
                )));
            }
        }

        for id in &item_ids {
            if self.retired_item_ids.iter().any(|r| r == id) {
                return Err(Error::Validation(format!(
                    "question {}: item id '{}' was deleted earlier and must not be reused",
                    self.id, id
                )));
            }
        }

        let mut key_seen = BTreeSet::new();
        for entry in &self.answer_key {
            if !key_seen.insert(entry.item_id.as_str()) {
                return Err(Error::Validation(format!(
                    "question {}: duplicate answer key entry for item '{}'",
                    self.id, entry.item_id
                )));
            }
            if !seen.contains(entry.item_id.as_str()) {
                return Err(Error::Validation(format!(
                    "question {}: answer key references nonexistent item '{}'",
                    self.id, entry.item_id
                )));
            }
            if entry.value.is_empty() {
                return Err(Error::Validation(format!(
                    "question {}: empty answer value for item '{}'",
                    self.id, entry.item_id
                )));
            }
        }

        match &self.details {
            QuestionDetails::SummaryCompletion { summary } => {
                let blanks = count_blanks(summary);
                if blanks == 0 {
                    return Err(Error::Validation(format!(
                        "question {}: summary template contains no '{}' blanks",
                        self.id, BLANK_MARKER
                    )));
                }
                if self.answer_key.len() != blanks {
                    return Err(Error::Validation(format!(
                        "question {}: {} blanks but {} answer key entries",
                        self.id,
                        blanks,
                        self.answer_key.len()
                    )));
                }
            }
            QuestionDetails::MultipleChoice { items } => {
                for item in items {
                    if item.options.len() < 2 {
                        return Err(Error::Validation(format!(
                            "question {}: item '{}' needs at least two options",
                            self.id, item.id
                        )));
                    }
                    let mut option_ids = BTreeSet::new();
                    for option in &item.options {
                        if !option_ids.insert(option.id.as_str()) {
                            return Err(Error::Validation(format!(
                                "question {}: item '{}' has duplicate option id '{}'",
                                self.id, item.id, option.id
                            )));
                        }
                    }
                }
            }
            QuestionDetails::MatchingHeading { headings: choices, .. }
            | QuestionDetails::MatchingSentenceEndings { endings: choices, .. }
            | QuestionDetails::MatchingFeatures { features: choices, .. } => {
                if choices.is_empty() {
                    return Err(Error::Validation(format!(
                        "question {}: {} has no selectable options",
                        self.id,
                        self.kind()
                    )));
                }
                let mut choice_ids = BTreeSet::new();
                for choice in choices {
                    if !choice_ids.insert(choice.id.as_str()) {
                        return Err(Error::Validation(format!(
                            "question {}: duplicate option id '{}'",
                            self.id, choice.id
                        )));
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, prompt: &str) -> QuestionItem {
        QuestionItem {
            id: id.into(),
            prompt: prompt.into(),
        }
    }

    fn key(item_id: &str, value: &str) -> AnswerKeyEntry {
        AnswerKeyEntry {
            item_id: item_id.into(),
            value: value.into(),
            justification: None,
        }
    }

    #[test]
    fn counts_blanks_in_summary_template() {
        assert_eq!(count_blanks("The tower in _____ opened in _____."), 2);
        assert_eq!(count_blanks("No blanks here."), 0);
    }

    #[test]
    fn summary_items_are_blank_positions() {
        let details = QuestionDetails::SummaryCompletion {
            summary: "Built in _____ by _____, finished _____.".into(),
        };
        assert_eq!(details.item_ids(), vec!["1", "2", "3"]);
        assert_eq!(details.item_count(), 3);
    }

    #[test]
    fn rejects_key_for_missing_item() {
        let q = Question {
            id: 1,
            requirement: "Do the statements agree?".into(),
            details: QuestionDetails::TrueFalseNotGiven {
                items: vec![item("1", "Statement one")],
            },
            answer_key: vec![key("1", "TRUE"), key("2", "FALSE")],
            retired_item_ids: vec![],
        };
        assert!(matches!(q.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_blank_count_mismatch() {
        let q = Question {
            id: 4,
            requirement: "Complete the summary.".into(),
            details: QuestionDetails::SummaryCompletion {
                summary: "Opened in _____.".into(),
            },
            answer_key: vec![key("1", "1889"), key("2", "Paris")],
            retired_item_ids: vec![],
        };
        assert!(matches!(q.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_reused_retired_item_id() {
        let q = Question {
            id: 2,
            requirement: "Choose the correct letter.".into(),
            details: QuestionDetails::MultipleChoice {
                items: vec![McqItem {
                    id: "1".into(),
                    prompt: "The writer says".into(),
                    options: vec![
                        Choice { id: "A".into(), text: "first".into() },
                        Choice { id: "B".into(), text: "second".into() },
                    ],
                }],
            },
            answer_key: vec![key("1", "A")],
            retired_item_ids: vec!["1".into()],
        };
        assert!(matches!(q.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn accepts_well_formed_matching_heading() {
        let q = Question {
            id: 3,
            requirement: "Choose the correct heading for each paragraph.".into(),
            details: QuestionDetails::MatchingHeading {
                items: vec![item("1", "Paragraph A"), item("2", "Paragraph B")],
                headings: vec![
                    Choice { id: "i".into(), text: "A slow start".into() },
                    Choice { id: "ii".into(), text: "An open question".into() },
                    Choice { id: "iii".into(), text: "The breakthrough".into() },
                ],
            },
            answer_key: vec![key("1", "ii"), key("2", "i")],
            retired_item_ids: vec![],
        };
        assert!(q.validate().is_ok());
    }
}
