#![allow(dead_code)]

use assessment_engine::dto::authoring_dto::{
    CreateQuestionPayload, CreateSectionPayload, CreateTestPayload,
};
use assessment_engine::models::question::{
    AnswerKeyEntry, Choice, QuestionDetails, QuestionItem,
};
use assessment_engine::models::test::{Passage, SectionContent, SkillType, Test};
use assessment_engine::models::test_result::AnswerMap;
use assessment_engine::models::user::{Principal, Role};
use assessment_engine::services::grading_service::{FixedGradingService, GradingBackend};
use assessment_engine::services::media_service::PassthroughMedia;
use assessment_engine::Engine;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub fn admin() -> Principal {
    Principal::new(Uuid::new_v4(), "Admin", Role::Administrator)
}

pub fn teacher() -> Principal {
    Principal::new(Uuid::new_v4(), "Teacher", Role::Teacher)
}

pub fn student() -> Principal {
    Principal::new(Uuid::new_v4(), "Student", Role::Student)
}

pub fn engine_with(grading: Arc<dyn GradingBackend>) -> Engine {
    Engine::new(grading, Arc::new(PassthroughMedia), Duration::from_secs(5))
}

pub fn engine() -> Engine {
    engine_with(Arc::new(FixedGradingService::new(
        6.5,
        serde_json::json!({ "task_response": "adequate", "coherence": "good" }),
    )))
}

pub fn item(id: &str, prompt: &str) -> QuestionItem {
    QuestionItem {
        id: id.into(),
        prompt: prompt.into(),
    }
}

pub fn choice(id: &str, text: &str) -> Choice {
    Choice {
        id: id.into(),
        text: text.into(),
    }
}

pub fn key(item_id: &str, value: &str) -> AnswerKeyEntry {
    AnswerKeyEntry {
        item_id: item_id.into(),
        value: value.into(),
        justification: None,
    }
}

/// Reading test with one section: a three-item matching_heading question
/// (correct headings A, C, B) and a two-blank summary_completion
/// (Paris, 1889). Five answerable items in total.
pub fn reading_test_payload() -> CreateTestPayload {
    CreateTestPayload {
        name: "Academic Reading 1".into(),
        skill: SkillType::Reading,
        sections: vec![CreateSectionPayload {
            title: "Passage 1".into(),
            content: SectionContent::Reading {
                passages: vec![
                    Passage {
                        label: "A".into(),
                        heading: None,
                        body: "The first paragraph.".into(),
                    },
                    Passage {
                        label: "B".into(),
                        heading: None,
                        body: "The second paragraph.".into(),
                    },
                    Passage {
                        label: "C".into(),
                        heading: None,
                        body: "The third paragraph.".into(),
                    },
                ],
            },
            image_keys: vec![],
            questions: vec![
                CreateQuestionPayload {
                    requirement: "Questions {start}-{end}: choose the correct heading.".into(),
                    details: QuestionDetails::MatchingHeading {
                        items: vec![
                            item("1", "Paragraph A"),
                            item("2", "Paragraph B"),
                            item("3", "Paragraph C"),
                        ],
                        headings: vec![
                            choice("A", "Early origins"),
                            choice("B", "A period of decline"),
                            choice("C", "An unexpected revival"),
                        ],
                    },
                    answer_key: vec![key("1", "A"), key("2", "C"), key("3", "B")],
                },
                CreateQuestionPayload {
                    requirement: "Questions {start}-{end}: complete the summary.".into(),
                    details: QuestionDetails::SummaryCompletion {
                        summary: "The tower in _____ opened in _____.".into(),
                    },
                    answer_key: vec![key("1", "Paris"), key("2", "1889")],
                },
            ],
        }],
    }
}

pub fn writing_test_payload() -> CreateTestPayload {
    CreateTestPayload {
        name: "Writing Task 2".into(),
        skill: SkillType::Writing,
        sections: vec![CreateSectionPayload {
            title: "Task 2".into(),
            content: SectionContent::Writing {
                task_prompt: "Some people believe exams are the fairest form of assessment. \
                              Discuss."
                    .into(),
            },
            image_keys: vec![],
            questions: vec![],
        }],
    }
}

pub fn speaking_test_payload() -> CreateTestPayload {
    CreateTestPayload {
        name: "Speaking Part 2".into(),
        skill: SkillType::Speaking,
        sections: vec![CreateSectionPayload {
            title: "Long turn".into(),
            content: SectionContent::Speaking {
                task_prompt: "Describe a place you would like to visit.".into(),
            },
            image_keys: vec![],
            questions: vec![],
        }],
    }
}

/// Builds an AnswerMap from (question id, [(item id, value)]) pairs.
pub fn answer_map(entries: &[(i32, &[(&str, &str)])]) -> AnswerMap {
    entries
        .iter()
        .map(|(question_id, items)| {
            let values: HashMap<String, String> = items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            (*question_id, values)
        })
        .collect()
}

pub async fn approved_test(
    engine: &Engine,
    author: &Principal,
    approver: &Principal,
    payload: CreateTestPayload,
) -> Test {
    let test = engine
        .test_service
        .create_test(author, payload)
        .await
        .expect("create test");
    engine
        .test_service
        .approve_test(approver, test.id)
        .await
        .expect("approve test")
}
