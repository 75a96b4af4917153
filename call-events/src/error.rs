/// Failures while ingesting a call event
#[derive(Debug, thiserror::Error)]
pub enum CallEventError {
    /// Malformed or unidentifiable input. Nothing was written.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Well-formed body with a `type` this service does not handle
    #[error("Unhandled event type: {0}")]
    UnhandledEventType(String),

    #[error("Persistence error while {mutation}: {source:#}")]
    Persistence {
        mutation: String,
        source: anyhow::Error,
    },
}

impl CallEventError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        CallEventError::InvalidEvent(reason.into())
    }

    pub fn persistence(mutation: impl Into<String>, source: anyhow::Error) -> Self {
        CallEventError::Persistence {
            mutation: mutation.into(),
            source,
        }
    }

    /// Unhandled types are logged and dropped rather than treated as failures
    pub fn is_ignorable(&self) -> bool {
        matches!(self, CallEventError::UnhandledEventType(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, CallEventError::Persistence { .. })
    }
}
