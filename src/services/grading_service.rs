use crate::error::{Error, Result};
use crate::models::test::SkillType;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A packaged writing or speaking submission, ready for the external
/// grading collaborator. Recordings travel as opaque storage keys.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectivePackage {
    pub skill: SkillType,
    pub task_prompts: Vec<String>,
    pub essay_text: Option<String>,
    pub recording_keys: Vec<String>,
}

/// What the collaborator returns: a band on the domain scale plus a
/// rubric-structured feedback object, persisted verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedBand {
    pub band: f32,
    pub feedback: JsonValue,
}

/// External grading collaborator. The timeout is supplied per call by the
/// submission processor; a timed-out or failed call surfaces as a retryable
/// error and leaves no partial state behind.
#[async_trait]
pub trait GradingBackend: Send + Sync {
    async fn grade(&self, package: &SubjectivePackage, timeout: Duration) -> Result<GradedBand>;
}

pub struct HttpGradingService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpGradingService {
    pub fn new(base_url: String, api_key: String, client: Client) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl GradingBackend for HttpGradingService {
    async fn grade(&self, package: &SubjectivePackage, timeout: Duration) -> Result<GradedBand> {
        let res = self
            .client
            .post(format!("{}/v1/grade", self.base_url))
            .bearer_auth(&self.api_key)
            .json(package)
            .timeout(timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Grading(format!(
                "grading API returned {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res.json().await?;
        let band = body
            .get("band")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| Error::Grading("grading response missing 'band'".to_string()))?;
        let feedback = body.get("feedback").cloned().unwrap_or(JsonValue::Null);

        Ok(GradedBand {
            band: band as f32,
            feedback,
        })
    }
}

/// Fixed-response grading backend for exercising the engine without the
/// real service.
pub struct FixedGradingService {
    band: f32,
    feedback: JsonValue,
    call_count: AtomicU32,
    last_package: Mutex<Option<SubjectivePackage>>,
}

impl FixedGradingService {
    pub fn new(band: f32, feedback: JsonValue) -> Self {
        Self {
            band,
            feedback,
            call_count: AtomicU32::new(0),
            last_package: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_package(&self) -> Option<SubjectivePackage> {
        self.last_package.lock().unwrap().clone()
    }
}

#[async_trait]
impl GradingBackend for FixedGradingService {
    async fn grade(&self, package: &SubjectivePackage, _timeout: Duration) -> Result<GradedBand> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_package.lock().unwrap() = Some(package.clone());
        Ok(GradedBand {
            band: self.band,
            feedback: self.feedback.clone(),
        })
    }
}

/// Always-failing backend, for exercising the retry surface.
pub struct UnavailableGradingService;

#[async_trait]
impl GradingBackend for UnavailableGradingService {
    async fn grade(&self, _package: &SubjectivePackage, _timeout: Duration) -> Result<GradedBand> {
        Err(Error::Grading("grading service unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_backend_records_calls() {
        let backend = FixedGradingService::new(7.0, serde_json::json!({"fluency": "good"}));
        let package = SubjectivePackage {
            skill: SkillType::Writing,
            task_prompts: vec!["Describe the chart.".into()],
            essay_text: Some("The chart shows...".into()),
            recording_keys: vec![],
        };

        let graded = backend
            .grade(&package, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(graded.band, 7.0);
        assert_eq!(backend.call_count(), 1);
        assert!(backend.last_package().unwrap().essay_text.is_some());
    }

    #[tokio::test]
    async fn unavailable_backend_is_retryable() {
        let backend = UnavailableGradingService;
        let package = SubjectivePackage {
            skill: SkillType::Speaking,
            task_prompts: vec![],
            essay_text: None,
            recording_keys: vec!["rec-1".into()],
        };
        let err = backend
            .grade(&package, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
