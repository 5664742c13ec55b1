pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use crate::services::{
    evaluation_service::EvaluationService,
    grading_service::{GradingBackend, HttpGradingService},
    media_service::{BaseUrlMedia, MediaStorage, PassthroughMedia},
    submission_service::SubmissionService,
    test_service::TestService,
};
use crate::store::MemoryStore;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// The assembled assessment engine: one store shared by the catalog, the
/// submission processor and the evaluation workflow. The thin API layer
/// above holds one of these and calls straight into the services.
#[derive(Clone)]
pub struct Engine {
    pub store: MemoryStore,
    pub test_service: TestService,
    pub submission_service: SubmissionService,
    pub evaluation_service: EvaluationService,
}

impl Engine {
    pub fn new(
        grading: Arc<dyn GradingBackend>,
        media: Arc<dyn MediaStorage>,
        grading_timeout: Duration,
    ) -> Self {
        let store = MemoryStore::new();
        let test_service = TestService::new(store.clone(), media);
        let submission_service =
            SubmissionService::new(store.clone(), grading, grading_timeout);
        let evaluation_service = EvaluationService::new(store.clone());

        Self {
            store,
            test_service,
            submission_service,
            evaluation_service,
        }
    }

    /// Wires the HTTP grading client and media resolver from the process
    /// configuration (`config::init_config` must have run).
    pub fn from_config() -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        let grading: Arc<dyn GradingBackend> = Arc::new(HttpGradingService::new(
            config.grading_api_url.clone(),
            config.grading_api_key.clone(),
            http_client,
        ));
        let media: Arc<dyn MediaStorage> = match &config.media_base_url {
            Some(base) => Arc::new(BaseUrlMedia::new(base.clone())),
            None => Arc::new(PassthroughMedia),
        };

        Self::new(grading, media, Duration::from_secs(config.grading_timeout_secs))
    }
}
