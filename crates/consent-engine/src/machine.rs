//! Consent UI state machine
//!
//! Phases are derived state: terminal phases are re-entered on later visits
//! from the persisted record, everything else exists only within a visit.
//! The pending phase models the persist as an asynchronous task with an
//! explicit outcome; failure returns the machine to `ReadyToAccept` so the
//! control re-enables and the viewer can retry.

use serde::{Deserialize, Serialize};

use crate::consent::ConsentRecord;
use crate::error::ConsentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentPhase {
    Undecided,
    ReadyToAccept,
    AcceptedPending,
    Accepted,
    Declined,
}

impl ConsentPhase {
    /// Phase to re-enter on page load given the persisted record.
    pub fn resume(record: Option<&ConsentRecord>) -> Self {
        match record {
            Some(r) if r.accepted => ConsentPhase::Accepted,
            Some(_) => ConsentPhase::Declined,
            None => ConsentPhase::Undecided,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentPhase::Undecided => "undecided",
            ConsentPhase::ReadyToAccept => "ready_to_accept",
            ConsentPhase::AcceptedPending => "accepted_pending",
            ConsentPhase::Accepted => "accepted",
            ConsentPhase::Declined => "declined",
        }
    }

    /// Whether the viewer has reached a final decision.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsentPhase::Accepted | ConsentPhase::Declined)
    }

    /// Apply the agreement checkbox. Only toggles between the two
    /// pre-decision phases; any other phase rejects the event.
    pub fn set_agreement(self, checked: bool) -> Result<Self, ConsentError> {
        match (self, checked) {
            (ConsentPhase::Undecided, true) => Ok(ConsentPhase::ReadyToAccept),
            (ConsentPhase::ReadyToAccept, false) => Ok(ConsentPhase::Undecided),
            (ConsentPhase::Undecided, false) | (ConsentPhase::ReadyToAccept, true) => Ok(self),
            _ => Err(ConsentError::InvalidTransition {
                phase: self.as_str(),
                event: "toggle agreement",
            }),
        }
    }

    /// Start the asynchronous accept task.
    pub fn begin_accept(self) -> Result<Self, ConsentError> {
        match self {
            ConsentPhase::ReadyToAccept => Ok(ConsentPhase::AcceptedPending),
            _ => Err(ConsentError::InvalidTransition {
                phase: self.as_str(),
                event: "accept",
            }),
        }
    }

    /// Settle the pending accept task with its outcome.
    pub fn settle_accept(self, succeeded: bool) -> Result<Self, ConsentError> {
        match self {
            ConsentPhase::AcceptedPending if succeeded => Ok(ConsentPhase::Accepted),
            ConsentPhase::AcceptedPending => Ok(ConsentPhase::ReadyToAccept),
            _ => Err(ConsentError::InvalidTransition {
                phase: self.as_str(),
                event: "settle accept",
            }),
        }
    }

    /// Decline, gated on the confirmation dialog result.
    pub fn decline(self, confirmed: bool) -> Result<Self, ConsentError> {
        if !confirmed {
            return Err(ConsentError::DeclineNotConfirmed);
        }
        match self {
            ConsentPhase::Undecided | ConsentPhase::ReadyToAccept => Ok(ConsentPhase::Declined),
            _ => Err(ConsentError::InvalidTransition {
                phase: self.as_str(),
                event: "decline",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn record(accepted: bool) -> ConsentRecord {
        ConsentRecord {
            accepted,
            version: "3.2".into(),
            accepted_at: accepted.then(Utc::now),
        }
    }

    #[test]
    fn test_resume_maps_record_to_terminal_phase() {
        assert_eq!(ConsentPhase::resume(None), ConsentPhase::Undecided);
        assert_eq!(
            ConsentPhase::resume(Some(&record(true))),
            ConsentPhase::Accepted
        );
        assert_eq!(
            ConsentPhase::resume(Some(&record(false))),
            ConsentPhase::Declined
        );
    }

    #[test]
    fn test_happy_path_to_accepted() {
        let phase = ConsentPhase::Undecided
            .set_agreement(true)
            .and_then(ConsentPhase::begin_accept)
            .and_then(|p| p.settle_accept(true))
            .unwrap();
        assert_eq!(phase, ConsentPhase::Accepted);
    }

    #[test]
    fn test_failed_persist_returns_to_ready() {
        let phase = ConsentPhase::AcceptedPending.settle_accept(false).unwrap();
        assert_eq!(phase, ConsentPhase::ReadyToAccept);
        // and the retry path works
        assert_eq!(phase.begin_accept().unwrap(), ConsentPhase::AcceptedPending);
    }

    #[test]
    fn test_accept_requires_agreement() {
        let err = ConsentPhase::Undecided.begin_accept().unwrap_err();
        assert_eq!(
            err,
            ConsentError::InvalidTransition {
                phase: "undecided",
                event: "accept",
            }
        );
    }

    #[test]
    fn test_decline_from_either_pre_decision_phase() {
        assert_eq!(
            ConsentPhase::Undecided.decline(true).unwrap(),
            ConsentPhase::Declined
        );
        assert_eq!(
            ConsentPhase::ReadyToAccept.decline(true).unwrap(),
            ConsentPhase::Declined
        );
    }

    #[test]
    fn test_unconfirmed_decline_is_rejected() {
        assert_eq!(
            ConsentPhase::Undecided.decline(false).unwrap_err(),
            ConsentError::DeclineNotConfirmed
        );
    }

    #[test]
    fn test_terminal_phases_reject_further_events() {
        assert!(ConsentPhase::Accepted.set_agreement(true).is_err());
        assert!(ConsentPhase::Declined.begin_accept().is_err());
        assert!(ConsentPhase::Accepted.decline(true).is_err());
    }

    #[test]
    fn test_agreement_toggle_is_idempotent() {
        assert_eq!(
            ConsentPhase::ReadyToAccept.set_agreement(true).unwrap(),
            ConsentPhase::ReadyToAccept
        );
        assert_eq!(
            ConsentPhase::Undecided.set_agreement(false).unwrap(),
            ConsentPhase::Undecided
        );
    }
}
