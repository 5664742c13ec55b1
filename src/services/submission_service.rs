use crate::dto::workflow_dto::SubmitTestRequest;
use crate::error::{Error, Result};
use crate::models::test::{SectionContent, Test};
use crate::models::test_result::TestResult;
use crate::models::user::Principal;
use crate::services::grading_service::{GradingBackend, SubjectivePackage};
use crate::services::scoring_service::ScoringService;
use crate::store::MemoryStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// Orchestrates one completed attempt into a TestResult: objective skills
/// are scored in-engine against the answer key, subjective skills are
/// packaged and handed to the grading collaborator.
#[derive(Clone)]
pub struct SubmissionService {
    store: MemoryStore,
    grading: Arc<dyn GradingBackend>,
    grading_timeout: Duration,
}

impl SubmissionService {
    pub fn new(
        store: MemoryStore,
        grading: Arc<dyn GradingBackend>,
        grading_timeout: Duration,
    ) -> Self {
        Self {
            store,
            grading,
            grading_timeout,
        }
    }

    /// Every successful submission appends exactly one TestResult; a student
    /// may attempt the same test again and keep the earlier results. Any
    /// scoring or grading failure aborts before anything is persisted.
    pub async fn submit(
        &self,
        principal: &Principal,
        test_id: Uuid,
        request: SubmitTestRequest,
    ) -> Result<TestResult> {
        if !principal.is_student() {
            return Err(Error::Forbidden(
                "Only students submit test attempts".to_string(),
            ));
        }
        request.validate()?;

        // One snapshot read; every question below is scored against it, so
        // concurrent answer-key edits cannot be seen mid-scoring.
        let test = self.store.get_test(test_id).await?;
        if !test.approved {
            return Err(Error::NotFound(format!("Test {} not found", test_id)));
        }

        let result = if test.skill.is_objective() {
            self.score_objective(principal, &test, &request)?
        } else {
            self.grade_subjective(principal, &test, &request).await?
        };

        let result = self.store.insert_result(result).await;
        self.store
            .update_test(test.id, |t| {
                t.attempt_count += 1;
                Ok(())
            })
            .await?;

        tracing::info!(
            result_id = %result.id,
            test_id = %test.id,
            student_id = %principal.id,
            score = result.score,
            total = result.total,
            "Submission processed"
        );
        Ok(result)
    }

    fn score_objective(
        &self,
        principal: &Principal,
        test: &Test,
        request: &SubmitTestRequest,
    ) -> Result<TestResult> {
        let unanswered = HashMap::new();
        let mut score: u32 = 0;
        let mut total: u32 = 0;
        for question in test.questions() {
            let submitted = request.answers.get(&question.id).unwrap_or(&unanswered);
            let question_score = ScoringService::score_question(question, submitted)?;
            score += question_score.correct_count();
            total += question_score.item_count as u32;
        }

        Ok(TestResult {
            id: Uuid::new_v4(),
            test_id: test.id,
            student_id: principal.id,
            test_name: test.name.clone(),
            skill: test.skill,
            score,
            total,
            band: None,
            feedback: None,
            answers: request.answers.clone(),
            essay_text: None,
            recording_keys: vec![],
            submitted_at: Utc::now(),
        })
    }

    async fn grade_subjective(
        &self,
        principal: &Principal,
        test: &Test,
        request: &SubmitTestRequest,
    ) -> Result<TestResult> {
        if test.skill == crate::models::test::SkillType::Writing
            && request.essay_text.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::Validation(
                "A writing submission needs essay text".to_string(),
            ));
        }
        if test.skill == crate::models::test::SkillType::Speaking
            && request.recording_keys.is_empty()
        {
            return Err(Error::Validation(
                "A speaking submission needs at least one recording".to_string(),
            ));
        }

        let task_prompts: Vec<String> = test
            .sections
            .iter()
            .filter_map(|s| match &s.content {
                SectionContent::Writing { task_prompt }
                | SectionContent::Speaking { task_prompt } => Some(task_prompt.clone()),
                _ => None,
            })
            .collect();

        let package = SubjectivePackage {
            skill: test.skill,
            task_prompts,
            essay_text: request.essay_text.clone(),
            recording_keys: request.recording_keys.clone(),
        };

        // Band and feedback are persisted verbatim; the engine never
        // second-guesses the collaborator's scoring.
        let graded = self.grading.grade(&package, self.grading_timeout).await?;

        Ok(TestResult {
            id: Uuid::new_v4(),
            test_id: test.id,
            student_id: principal.id,
            test_name: test.name.clone(),
            skill: test.skill,
            score: 0,
            total: 0,
            band: Some(graded.band),
            feedback: Some(graded.feedback),
            answers: request.answers.clone(),
            essay_text: request.essay_text.clone(),
            recording_keys: request.recording_keys.clone(),
            submitted_at: Utc::now(),
        })
    }

    pub async fn get_result(&self, principal: &Principal, result_id: Uuid) -> Result<TestResult> {
        let result = self.store.get_result(result_id).await?;
        if principal.is_student() && result.student_id != principal.id {
            return Err(Error::Forbidden(
                "Students may only read their own results".to_string(),
            ));
        }
        Ok(result)
    }

    pub async fn results_for_student(
        &self,
        principal: &Principal,
        student_id: Uuid,
    ) -> Result<Vec<TestResult>> {
        if principal.is_student() && principal.id != student_id {
            return Err(Error::Forbidden(
                "Students may only list their own results".to_string(),
            ));
        }
        Ok(self.store.results_for_student(student_id).await)
    }
}
