use thiserror::Error;

/// Failures surfaced by the tracking engine.
///
/// Every variant leaves enough state behind to retry: nothing here discards
/// captured segments or clears a draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("{0}")]
    Validation(String),
    #[error("your account is awaiting approval; time tracking is blocked")]
    ApprovalBlocked,
    #[error("nothing was captured in this session")]
    NothingCaptured,
    #[error("network request failed: {0}")]
    TransientNetwork(String),
    #[error("saved draft could not be read: {0}")]
    CorruptDraft(String),
    #[error("local storage failed: {0}")]
    Storage(String),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }

    pub fn network(err: anyhow::Error) -> Self {
        TrackerError::TransientNetwork(format!("{err:#}"))
    }

    pub fn storage(err: anyhow::Error) -> Self {
        TrackerError::Storage(format!("{err:#}"))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrackerError::TransientNetwork(_) | TrackerError::Storage(_)
        )
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
