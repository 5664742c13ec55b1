use crate::error::{Error, Result};
use crate::models::evaluation::Evaluation;
use crate::models::test::Test;
use crate::models::test_result::TestResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory aggregate store. Cloning is cheap and shares the underlying
/// maps, mirroring how services share a database handle.
///
/// Reads hand out clones, so a caller always scores against one snapshot:
/// edits that land after the read are invisible to it. Updates run a closure
/// against a copy under the write lock and only replace the stored value if
/// the closure succeeds, which is what makes the workflow's guarded
/// transitions atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    tests: RwLock<HashMap<Uuid, Test>>,
    results: RwLock<HashMap<Uuid, TestResult>>,
    evaluations: RwLock<HashMap<Uuid, Evaluation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_test(&self, test: Test) -> Test {
        let mut tests = self.inner.tests.write().await;
        tests.insert(test.id, test.clone());
        test
    }

    pub async fn get_test(&self, id: Uuid) -> Result<Test> {
        let tests = self.inner.tests.read().await;
        tests
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Test {} not found", id)))
    }

    pub async fn update_test<F>(&self, id: Uuid, f: F) -> Result<Test>
    where
        F: FnOnce(&mut Test) -> Result<()>,
    {
        let mut tests = self.inner.tests.write().await;
        let current = tests
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("Test {} not found", id)))?;
        let mut updated = current.clone();
        f(&mut updated)?;
        updated.updated_at = chrono::Utc::now();
        tests.insert(id, updated.clone());
        Ok(updated)
    }

    pub async fn remove_test(&self, id: Uuid) -> Result<()> {
        let mut tests = self.inner.tests.write().await;
        tests
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("Test {} not found", id)))
    }

    pub async fn list_tests(&self) -> Vec<Test> {
        let tests = self.inner.tests.read().await;
        let mut all: Vec<Test> = tests.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    pub async fn insert_result(&self, result: TestResult) -> TestResult {
        let mut results = self.inner.results.write().await;
        results.insert(result.id, result.clone());
        result
    }

    pub async fn get_result(&self, id: Uuid) -> Result<TestResult> {
        let results = self.inner.results.read().await;
        results
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("TestResult {} not found", id)))
    }

    pub async fn update_result<F>(&self, id: Uuid, f: F) -> Result<TestResult>
    where
        F: FnOnce(&mut TestResult) -> Result<()>,
    {
        let mut results = self.inner.results.write().await;
        let current = results
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("TestResult {} not found", id)))?;
        let mut updated = current.clone();
        f(&mut updated)?;
        results.insert(id, updated.clone());
        Ok(updated)
    }

    pub async fn results_for_student(&self, student_id: Uuid) -> Vec<TestResult> {
        let results = self.inner.results.read().await;
        let mut own: Vec<TestResult> = results
            .values()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        own.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        own
    }

    /// Inserts a new evaluation unless a non-completed one already exists
    /// for the same result. The check and the insert happen under one write
    /// lock, so two racing requests cannot both succeed.
    pub async fn insert_evaluation_guarded(&self, evaluation: Evaluation) -> Result<Evaluation> {
        let mut evaluations = self.inner.evaluations.write().await;
        if let Some(active) = evaluations
            .values()
            .find(|e| e.result_id == evaluation.result_id && !e.status.is_completed())
        {
            return Err(Error::state_conflict(
                format!(
                    "an evaluation for result {} is already open",
                    evaluation.result_id
                ),
                active.status.name(),
            ));
        }
        evaluations.insert(evaluation.id, evaluation.clone());
        Ok(evaluation)
    }

    pub async fn get_evaluation(&self, id: Uuid) -> Result<Evaluation> {
        let evaluations = self.inner.evaluations.read().await;
        evaluations
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Evaluation {} not found", id)))
    }

    /// Guarded compare-and-set: the closure sees the current value under the
    /// write lock and may refuse the transition; nothing is written unless
    /// it returns Ok.
    pub async fn update_evaluation<F>(&self, id: Uuid, f: F) -> Result<Evaluation>
    where
        F: FnOnce(&mut Evaluation) -> Result<()>,
    {
        let mut evaluations = self.inner.evaluations.write().await;
        let current = evaluations
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("Evaluation {} not found", id)))?;
        let mut updated = current.clone();
        f(&mut updated)?;
        evaluations.insert(id, updated.clone());
        Ok(updated)
    }

    pub async fn list_evaluations(&self) -> Vec<Evaluation> {
        let evaluations = self.inner.evaluations.read().await;
        let mut all: Vec<Evaluation> = evaluations.values().cloned().collect();
        all.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::evaluation::EvaluationStatus;
    use chrono::Utc;

    fn pending_evaluation(result_id: Uuid) -> Evaluation {
        Evaluation {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            result_id,
            requested_at: Utc::now(),
            status: EvaluationStatus::Pending,
        }
    }

    #[test]
    fn second_open_evaluation_for_same_result_is_rejected() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let result_id = Uuid::new_v4();
            store
                .insert_evaluation_guarded(pending_evaluation(result_id))
                .await
                .unwrap();

            let err = store
                .insert_evaluation_guarded(pending_evaluation(result_id))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::StateConflict { .. }));
        });
    }

    #[test]
    fn failed_update_leaves_stored_value_untouched() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let evaluation = pending_evaluation(Uuid::new_v4());
            let id = evaluation.id;
            store.insert_evaluation_guarded(evaluation).await.unwrap();

            let err = store
                .update_evaluation(id, |e| {
                    e.status = EvaluationStatus::Assigned {
                        teacher_id: Uuid::new_v4(),
                        assigned_at: Utc::now(),
                    };
                    Err(Error::Validation("refused".into()))
                })
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));

            let stored = store.get_evaluation(id).await.unwrap();
            assert_eq!(stored.status, EvaluationStatus::Pending);
        });
    }
}
