use shared::domain::ControllerId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdError>;

#[derive(Debug, Error)]
pub enum AdError {
    #[error("no ad unit id given and no default unit id configured")]
    MissingUnitId,
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),
    #[error("controller {id} has been disposed")]
    UseAfterDispose { id: ControllerId },
    #[error("event streams are closed")]
    StreamClosed,
    #[error("controller id {id} is already live")]
    DuplicateControllerId { id: ControllerId },
    #[error("native bridge failure: {0}")]
    Bridge(#[source] anyhow::Error),
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Settings(String),
}

impl AdError {
    pub fn is_use_after_dispose(&self) -> bool {
        matches!(self, AdError::UseAfterDispose { .. })
    }
}
