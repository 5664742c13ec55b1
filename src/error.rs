pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid payload: {0}")]
    Payload(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("State conflict: {reason} (current state: {current})")]
    StateConflict { reason: String, current: String },

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Grading service error: {0}")]
    Grading(String),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn state_conflict(reason: impl Into<String>, current: impl Into<String>) -> Self {
        Error::StateConflict {
            reason: reason.into(),
            current: current.into(),
        }
    }

    /// Transient failures of the external grading collaborator. Callers may
    /// retry these; the submission they belong to has not been persisted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Grading(_) | Error::Reqwest(_))
    }
}
