use crate::dto::authoring_dto::{CreateQuestionPayload, CreateTestPayload, UpdateTestPayload};
use crate::dto::presentation_dto::{
    PresentedQuestion, PresentedSection, PresentedSectionContent, PresentedTest,
};
use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionDetails};
use crate::models::test::{Section, SectionContent, SkillType, Test};
use crate::models::user::Principal;
use crate::services::randomizer;
use crate::services::media_service::MediaStorage;
use crate::store::MemoryStore;
use crate::utils::template::resolve_requirement;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedTests {
    #[serde(rename = "items")]
    pub tests: Vec<Test>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Default)]
pub struct TestFilter {
    pub skill: Option<SkillType>,
    pub approved: Option<bool>,
    pub created_by: Option<Uuid>,
    pub search: Option<String>,
}

/// The test catalog: authoring, approval, listing, and the student-facing
/// randomized fetch.
#[derive(Clone)]
pub struct TestService {
    store: MemoryStore,
    media: Arc<dyn MediaStorage>,
}

impl TestService {
    pub fn new(store: MemoryStore, media: Arc<dyn MediaStorage>) -> Self {
        Self { store, media }
    }

    pub async fn create_test(
        &self,
        principal: &Principal,
        payload: CreateTestPayload,
    ) -> Result<Test> {
        if !principal.can_author() {
            return Err(Error::Forbidden(
                "Only teachers and administrators can author tests".to_string(),
            ));
        }
        payload.validate()?;

        let mut next_question_id = 1;
        let mut sections = Vec::with_capacity(payload.sections.len());
        for section in payload.sections {
            let mut questions = Vec::with_capacity(section.questions.len());
            for question in section.questions {
                questions.push(build_question(next_question_id, question));
                next_question_id += 1;
            }
            sections.push(Section {
                title: section.title,
                content: section.content,
                image_keys: section.image_keys,
                questions,
            });
        }

        let now = Utc::now();
        let test = Test {
            id: Uuid::new_v4(),
            name: payload.name,
            skill: payload.skill,
            created_by: principal.id,
            approved: false,
            attempt_count: 0,
            next_question_id,
            sections,
            created_at: now,
            updated_at: now,
        };
        test.validate()?;

        let test = self.store.insert_test(test).await;
        tracing::info!(test_id = %test.id, skill = %test.skill, "Test created");
        Ok(test)
    }

    /// Authoring view, answer key included. Restricted to the creator and
    /// administrators.
    pub async fn get_test(&self, principal: &Principal, test_id: Uuid) -> Result<Test> {
        let test = self.store.get_test(test_id).await?;
        authorize_edit(principal, &test)?;
        Ok(test)
    }

    pub async fn update_test(
        &self,
        principal: &Principal,
        test_id: Uuid,
        payload: UpdateTestPayload,
    ) -> Result<Test> {
        payload.validate()?;
        let principal = principal.clone();
        self.store
            .update_test(test_id, move |test| {
                authorize_edit(&principal, test)?;
                if let Some(name) = payload.name {
                    test.name = name;
                }
                Ok(())
            })
            .await
    }

    pub async fn add_question(
        &self,
        principal: &Principal,
        test_id: Uuid,
        section_index: usize,
        payload: CreateQuestionPayload,
    ) -> Result<Test> {
        let principal = principal.clone();
        let updated = self
            .store
            .update_test(test_id, move |test| {
                authorize_edit(&principal, test)?;
                let question_id = test.next_question_id;
                let section = test.sections.get_mut(section_index).ok_or_else(|| {
                    Error::NotFound(format!("Section {} not found", section_index))
                })?;
                section.questions.push(build_question(question_id, payload));
                test.next_question_id += 1;
                test.validate()
            })
            .await?;
        tracing::info!(test_id = %test_id, "Question added");
        Ok(updated)
    }

    /// Replaces a question's requirement, payload and answer key. Item ids
    /// that disappear in the replacement are retired for good: a later edit
    /// reintroducing one of them is rejected, so an old id can never come
    /// back pointing at different content.
    pub async fn update_question(
        &self,
        principal: &Principal,
        test_id: Uuid,
        question_id: i32,
        payload: CreateQuestionPayload,
    ) -> Result<Test> {
        let principal = principal.clone();
        self.store
            .update_test(test_id, move |test| {
                authorize_edit(&principal, test)?;
                let question = test
                    .sections
                    .iter_mut()
                    .flat_map(|s| s.questions.iter_mut())
                    .find(|q| q.id == question_id)
                    .ok_or_else(|| {
                        Error::NotFound(format!("Question {} not found", question_id))
                    })?;

                let old_ids: BTreeSet<String> =
                    question.details.item_ids().into_iter().collect();
                let new_ids: BTreeSet<String> =
                    payload.details.item_ids().into_iter().collect();
                for removed in old_ids.difference(&new_ids) {
                    if !question.retired_item_ids.contains(removed) {
                        question.retired_item_ids.push(removed.clone());
                    }
                }

                question.requirement = payload.requirement;
                question.details = payload.details;
                question.answer_key = payload.answer_key;
                test.validate()
            })
            .await
    }

    pub async fn remove_question(
        &self,
        principal: &Principal,
        test_id: Uuid,
        question_id: i32,
    ) -> Result<Test> {
        let principal = principal.clone();
        self.store
            .update_test(test_id, move |test| {
                authorize_edit(&principal, test)?;
                for section in test.sections.iter_mut() {
                    if let Some(pos) = section.questions.iter().position(|q| q.id == question_id)
                    {
                        section.questions.remove(pos);
                        return Ok(());
                    }
                }
                Err(Error::NotFound(format!(
                    "Question {} not found",
                    question_id
                )))
            })
            .await
    }

    /// Flips the publication flag. Tests are invisible to students until an
    /// administrator approves them.
    pub async fn approve_test(&self, principal: &Principal, test_id: Uuid) -> Result<Test> {
        if !principal.is_admin() {
            return Err(Error::Forbidden(
                "Only administrators can approve tests".to_string(),
            ));
        }
        let updated = self
            .store
            .update_test(test_id, |test| {
                test.approved = true;
                Ok(())
            })
            .await?;
        tracing::info!(test_id = %test_id, "Test approved");
        Ok(updated)
    }

    pub async fn delete_test(&self, principal: &Principal, test_id: Uuid) -> Result<()> {
        let test = self.store.get_test(test_id).await?;
        authorize_edit(principal, &test)?;
        self.store.remove_test(test_id).await?;
        tracing::info!(test_id = %test_id, "Test deleted");
        Ok(())
    }

    /// Filtered, paginated listing. Approval is enforced server-side: a
    /// student's listing is filtered to approved tests no matter what the
    /// caller passed in the filter.
    pub async fn list_tests(
        &self,
        principal: &Principal,
        filter: Option<TestFilter>,
        page: i64,
        per_page: i64,
    ) -> Result<PaginatedTests> {
        let mut filter = filter.unwrap_or_default();
        if principal.is_student() {
            filter.approved = Some(true);
        }

        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let matching: Vec<Test> = self
            .store
            .list_tests()
            .await
            .into_iter()
            .filter(|t| filter.skill.map_or(true, |s| t.skill == s))
            .filter(|t| filter.approved.map_or(true, |a| t.approved == a))
            .filter(|t| filter.created_by.map_or(true, |c| t.created_by == c))
            .filter(|t| {
                search
                    .as_ref()
                    .map_or(true, |s| t.name.to_lowercase().contains(s))
            })
            .collect();

        let total = matching.len() as i64;
        let total_pages = if per_page > 0 {
            (total as f64 / per_page as f64).ceil() as i64
        } else {
            1
        };
        let offset = ((page - 1) * per_page).max(0) as usize;
        let tests: Vec<Test> = matching
            .into_iter()
            .skip(offset)
            .take(per_page.max(0) as usize)
            .collect();

        Ok(PaginatedTests {
            tests,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Student-facing fetch: a fresh presentation arrangement of an
    /// approved test. Unapproved tests answer NotFound, indistinguishable
    /// from ids that never existed.
    pub async fn fetch_for_attempt(
        &self,
        principal: &Principal,
        test_id: Uuid,
    ) -> Result<PresentedTest> {
        if !principal.is_student() {
            return Err(Error::Forbidden(
                "Only students fetch tests for an attempt".to_string(),
            ));
        }
        let test = self.store.get_test(test_id).await?;
        if !test.approved {
            return Err(Error::NotFound(format!("Test {} not found", test_id)));
        }
        Ok(self.present(&test))
    }

    fn present(&self, test: &Test) -> PresentedTest {
        let mut rng = rand::thread_rng();
        let mut item_counter = 0usize;

        let sections = test
            .sections
            .iter()
            .map(|section| PresentedSection {
                title: section.title.clone(),
                content: self.present_content(&section.content),
                image_urls: section
                    .image_keys
                    .iter()
                    .map(|k| self.media.resolve(k))
                    .collect(),
                questions: section
                    .questions
                    .iter()
                    .map(|q| {
                        let count = q.details.item_count();
                        let start = item_counter + 1;
                        let end = item_counter + count.max(1);
                        item_counter += count;
                        self.present_question(q, start, end, &mut rng)
                    })
                    .collect(),
            })
            .collect();

        PresentedTest {
            id: test.id,
            name: test.name.clone(),
            skill: test.skill,
            total_items: test.answerable_items(),
            sections,
        }
    }

    fn present_content(&self, content: &SectionContent) -> PresentedSectionContent {
        match content {
            SectionContent::Reading { passages } => PresentedSectionContent::Reading {
                passages: passages.clone(),
            },
            SectionContent::Listening { audio_key, .. } => PresentedSectionContent::Listening {
                audio_url: self.media.resolve(audio_key),
            },
            SectionContent::Writing { task_prompt } => PresentedSectionContent::Writing {
                task_prompt: task_prompt.clone(),
            },
            SectionContent::Speaking { task_prompt } => PresentedSectionContent::Speaking {
                task_prompt: task_prompt.clone(),
            },
        }
    }

    fn present_question(
        &self,
        question: &Question,
        start: usize,
        end: usize,
        rng: &mut impl rand::Rng,
    ) -> PresentedQuestion {
        let mut details = randomizer::randomize_question(&question.details, rng);
        if let QuestionDetails::DiagramCompletion { image_key, .. } = &mut details {
            *image_key = image_key.as_ref().map(|k| self.media.resolve(k));
        }
        PresentedQuestion {
            id: question.id,
            requirement: resolve_requirement(&question.requirement, start, end),
            number_start: start,
            number_end: end,
            details,
        }
    }
}

fn build_question(id: i32, payload: CreateQuestionPayload) -> Question {
    Question {
        id,
        requirement: payload.requirement,
        details: payload.details,
        answer_key: payload.answer_key,
        retired_item_ids: vec![],
    }
}

fn authorize_edit(principal: &Principal, test: &Test) -> Result<()> {
    if principal.is_admin() || (principal.can_author() && test.created_by == principal.id) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "Principal {} may not modify test {}",
            principal.id, test.id
        )))
    }
}
