//! Consent records and versioned persistence
//!
//! A decision is only valid for the document version it was made against.
//! A stored record for any other version is treated as unset so the viewer
//! is re-prompted after a document revision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConsentError;
use crate::store::{ConsentStore, KEY_ACCEPTED, KEY_ACCEPTED_DATE, KEY_VERSION};

/// The viewer's explicit decision on the terms document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Declined,
}

/// A persisted consent decision for a specific document version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub accepted: bool,
    pub version: String,
    pub accepted_at: Option<DateTime<Utc>>,
}

/// Persist a decision, overwriting any prior record.
///
/// Write failures surface as [`ConsentError::Store`] so the caller can
/// re-enable the control and offer a retry; partial writes leave the store
/// without a decision flag and read back as unset.
pub fn record_decision<S: ConsentStore>(
    store: &mut S,
    decision: Decision,
    version: &str,
) -> Result<ConsentRecord, ConsentError> {
    let accepted = decision == Decision::Accepted;
    let now = Utc::now();

    // The decision flag goes last; a partial write reads back as unset.
    store.set(KEY_VERSION, version)?;
    if accepted {
        store.set(KEY_ACCEPTED_DATE, &now.to_rfc3339())?;
    } else {
        store.remove(KEY_ACCEPTED_DATE)?;
    }
    store.set(KEY_ACCEPTED, if accepted { "true" } else { "false" })?;

    Ok(ConsentRecord {
        accepted,
        version: version.to_string(),
        accepted_at: accepted.then_some(now),
    })
}

/// Load the persisted decision, if any, for `current_version`.
///
/// Returns `None` when no record exists, when the stored version differs
/// from `current_version`, or when the backend fails. Storage errors are
/// logged and degrade to "no prior decision" rather than propagating.
pub fn load_decision<S: ConsentStore>(store: &S, current_version: &str) -> Option<ConsentRecord> {
    let accepted = match store.get(KEY_ACCEPTED) {
        Ok(value) => match value?.as_str() {
            "true" => true,
            "false" => false,
            other => {
                tracing::debug!(value = other, "Ignoring malformed consent flag");
                return None;
            }
        },
        Err(err) => {
            tracing::debug!(error = %err, "Consent storage unreadable, treating as undecided");
            return None;
        }
    };

    let version = store.get(KEY_VERSION).ok().flatten()?;
    if version != current_version {
        return None;
    }

    let accepted_at = store
        .get(KEY_ACCEPTED_DATE)
        .ok()
        .flatten()
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Some(ConsentRecord {
        accepted,
        version,
        accepted_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_then_load_same_version() {
        let mut store = MemoryStore::new();
        let record = record_decision(&mut store, Decision::Accepted, "3.2").unwrap();

        let loaded = load_decision(&store, "3.2").expect("record should load");
        assert_eq!(loaded, record);
        assert!(loaded.accepted);
        assert!(loaded.accepted_at.is_some());
    }

    #[test]
    fn test_version_mismatch_reads_as_unset() {
        let mut store = MemoryStore::new();
        record_decision(&mut store, Decision::Accepted, "3.2").unwrap();

        assert_eq!(load_decision(&store, "3.3"), None);
    }

    #[test]
    fn test_empty_store_reads_as_unset() {
        let store = MemoryStore::new();
        assert_eq!(load_decision(&store, "3.2"), None);
    }

    #[test]
    fn test_decline_records_false_without_timestamp() {
        let mut store = MemoryStore::new();
        let record = record_decision(&mut store, Decision::Declined, "3.2").unwrap();
        assert!(!record.accepted);
        assert_eq!(record.accepted_at, None);

        let loaded = load_decision(&store, "3.2").unwrap();
        assert!(!loaded.accepted);
        assert_eq!(loaded.accepted_at, None);
    }

    #[test]
    fn test_new_decision_overwrites_prior_record() {
        let mut store = MemoryStore::new();
        record_decision(&mut store, Decision::Declined, "3.1").unwrap();
        record_decision(&mut store, Decision::Accepted, "3.2").unwrap();

        let loaded = load_decision(&store, "3.2").unwrap();
        assert!(loaded.accepted);
        assert_eq!(load_decision(&store, "3.1"), None);
    }

    #[test]
    fn test_malformed_flag_reads_as_unset() {
        let mut store = MemoryStore::new();
        store.set(KEY_ACCEPTED, "yes").unwrap();
        store.set(KEY_VERSION, "3.2").unwrap();
        assert_eq!(load_decision(&store, "3.2"), None);
    }

    #[test]
    fn test_garbled_timestamp_still_loads_decision() {
        let mut store = MemoryStore::new();
        record_decision(&mut store, Decision::Accepted, "3.2").unwrap();
        store.set(KEY_ACCEPTED_DATE, "not-a-date").unwrap();

        let loaded = load_decision(&store, "3.2").unwrap();
        assert!(loaded.accepted);
        assert_eq!(loaded.accepted_at, None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Loading under any version other than the stored one is unset.
            #[test]
            fn prop_load_none_on_any_version_mismatch(
                stored in "[0-9]{1,2}\\.[0-9]{1,2}",
                current in "[0-9]{1,2}\\.[0-9]{1,2}",
            ) {
                let mut store = MemoryStore::new();
                record_decision(&mut store, Decision::Accepted, &stored).unwrap();

                let loaded = load_decision(&store, &current);
                if stored == current {
                    prop_assert!(loaded.is_some());
                } else {
                    prop_assert!(loaded.is_none());
                }
            }
        }
    }
}
