use thiserror::Error;

/// Errors raised by a [`ConsentStore`](crate::store::ConsentStore) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("Failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A state-machine transition that is not legal from the current phase,
    /// e.g. confirming acceptance before the agreement box is checked.
    #[error("Cannot {event} while {phase}")]
    InvalidTransition {
        phase: &'static str,
        event: &'static str,
    },

    /// The decline path requires an explicit confirmation from the viewer.
    #[error("Decline was not confirmed")]
    DeclineNotConfirmed,
}

impl ConsentError {
    /// Whether the viewer can retry the operation that produced this error.
    /// Storage-write failures re-enable the accept control; transition
    /// errors indicate a caller bug and are not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConsentError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_retryable() {
        let err = ConsentError::from(StoreError::Write {
            key: "terms_accepted".into(),
            reason: "quota exceeded".into(),
        });
        assert!(err.is_retryable());
    }

    #[test]
    fn test_transition_errors_are_not_retryable() {
        let err = ConsentError::InvalidTransition {
            phase: "undecided",
            event: "accept",
        };
        assert!(!err.is_retryable());
    }
}
