use crate::dto::workflow_dto::CompleteEvaluationPayload;
use crate::error::{Error, Result};
use crate::models::evaluation::{Evaluation, EvaluationStatus};
use crate::models::user::Principal;
use crate::store::MemoryStore;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

/// The human-evaluation workflow: student request → administrator
/// assignment → teacher completion. Transitions only ever move forward;
/// every guard runs inside the store's write lock, so racing callers get a
/// state-conflict error naming the state that actually won.
#[derive(Clone)]
pub struct EvaluationService {
    store: MemoryStore,
}

impl EvaluationService {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Opens a pending evaluation for one of the caller's own writing or
    /// speaking results. At most one non-completed evaluation may exist per
    /// result at any time.
    pub async fn request(&self, principal: &Principal, result_id: Uuid) -> Result<Evaluation> {
        if !principal.is_student() {
            return Err(Error::Forbidden(
                "Only students request evaluations".to_string(),
            ));
        }
        let result = self.store.get_result(result_id).await?;
        if result.student_id != principal.id {
            return Err(Error::Forbidden(
                "Students may only request evaluation of their own results".to_string(),
            ));
        }
        if !result.eligible_for_evaluation() {
            return Err(Error::Validation(format!(
                "{} results are scored automatically and take no human evaluation",
                result.skill
            )));
        }

        let evaluation = Evaluation {
            id: Uuid::new_v4(),
            student_id: principal.id,
            result_id,
            requested_at: Utc::now(),
            status: EvaluationStatus::Pending,
        };
        let evaluation = self.store.insert_evaluation_guarded(evaluation).await?;
        tracing::info!(
            evaluation_id = %evaluation.id,
            result_id = %result_id,
            "Evaluation requested"
        );
        Ok(evaluation)
    }

    /// pending → assigned. Administrator-only; exactly one of any set of
    /// concurrent assignment attempts wins.
    pub async fn assign(
        &self,
        principal: &Principal,
        evaluation_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<Evaluation> {
        if !principal.is_admin() {
            return Err(Error::Forbidden(
                "Only administrators assign evaluations".to_string(),
            ));
        }

        let outcome = self
            .store
            .update_evaluation(evaluation_id, move |evaluation| {
                match &evaluation.status {
                    EvaluationStatus::Pending => {
                        evaluation.status = EvaluationStatus::Assigned {
                            teacher_id,
                            assigned_at: Utc::now(),
                        };
                        Ok(())
                    }
                    other => Err(Error::state_conflict(
                        "only a pending evaluation can be assigned",
                        other.name(),
                    )),
                }
            })
            .await;

        match &outcome {
            Ok(evaluation) => tracing::info!(
                evaluation_id = %evaluation.id,
                teacher_id = %teacher_id,
                "Evaluation assigned"
            ),
            Err(Error::StateConflict { current, .. }) => tracing::warn!(
                evaluation_id = %evaluation_id,
                current = %current,
                "Assignment rejected"
            ),
            Err(_) => {}
        }
        outcome
    }

    /// assigned → completed, restricted to the assigned teacher. Completing
    /// straight from pending is a conflict, and a completed evaluation is
    /// never touched again.
    pub async fn complete(
        &self,
        principal: &Principal,
        evaluation_id: Uuid,
        payload: CompleteEvaluationPayload,
    ) -> Result<Evaluation> {
        payload.validate()?;
        let principal_id = principal.id;
        let feedback = payload.feedback;

        let outcome = self
            .store
            .update_evaluation(evaluation_id, move |evaluation| {
                match evaluation.status.clone() {
                    EvaluationStatus::Assigned {
                        teacher_id,
                        assigned_at,
                    } => {
                        if teacher_id != principal_id {
                            return Err(Error::Forbidden(
                                "Only the assigned teacher can complete this evaluation"
                                    .to_string(),
                            ));
                        }
                        evaluation.status = EvaluationStatus::Completed {
                            teacher_id,
                            assigned_at,
                            completed_at: Utc::now(),
                            feedback,
                        };
                        Ok(())
                    }
                    other => Err(Error::state_conflict(
                        "only an assigned evaluation can be completed",
                        other.name(),
                    )),
                }
            })
            .await;

        if let Ok(evaluation) = &outcome {
            tracing::info!(evaluation_id = %evaluation.id, "Evaluation completed");
        }
        outcome
    }

    /// Role-scoped listing: students see their own requests, teachers their
    /// assignments, administrators everything.
    pub async fn list_for(&self, principal: &Principal) -> Result<Vec<Evaluation>> {
        let all = self.store.list_evaluations().await;
        let filtered = if principal.is_admin() {
            all
        } else if principal.is_teacher() {
            all.into_iter()
                .filter(|e| e.assigned_teacher() == Some(principal.id))
                .collect()
        } else {
            all.into_iter()
                .filter(|e| e.student_id == principal.id)
                .collect()
        };
        Ok(filtered)
    }
}
