//! Analytics boundary
//!
//! The tracker emits `(name, category, label, value)` tuples through a
//! pluggable sink. The default sink is a structured-logging stand-in; real
//! transports plug in at the application layer.

use serde::{Deserialize, Serialize};

/// A single tracking event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    pub category: String,
    pub label: String,
    pub value: Option<i64>,
}

impl AnalyticsEvent {
    pub fn new(name: &str, category: &str, label: &str, value: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            label: label.to_string(),
            value,
        }
    }

    pub fn page_view(version: &str) -> Self {
        Self::new("terms_page_view", "terms", version, None)
    }

    pub fn section_view(section_id: &str) -> Self {
        Self::new("section_view", "terms", section_id, None)
    }

    pub fn scroll_depth(percent: u8) -> Self {
        Self::new("scroll_depth", "engagement", "terms", Some(percent as i64))
    }

    pub fn time_on_page(seconds: u32) -> Self {
        Self::new("time_on_page", "engagement", "terms", Some(seconds as i64))
    }

    pub fn accepted(version: &str) -> Self {
        Self::new("terms_accepted", "terms", version, None)
    }

    pub fn declined(version: &str) -> Self {
        Self::new("terms_declined", "terms", version, None)
    }

    pub fn accept_retry_shown(version: &str) -> Self {
        Self::new("accept_retry_shown", "terms", version, None)
    }
}

/// Sink accepting tracking events. Implementations must not fail; dropping
/// an event is always preferable to interrupting the page.
pub trait AnalyticsSink {
    fn track(&self, event: &AnalyticsEvent);
}

/// Structured-logging sink, the no-op transport stand-in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn track(&self, event: &AnalyticsEvent) {
        tracing::info!(
            target: "analytics",
            name = %event.name,
            category = %event.category,
            label = %event.label,
            value = event.value,
            "track"
        );
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn track(&self, _event: &AnalyticsEvent) {}
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records events for assertions.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingSink {
        pub events: Rc<RefCell<Vec<AnalyticsEvent>>>,
    }

    impl RecordingSink {
        pub fn names(&self) -> Vec<String> {
            self.events.borrow().iter().map(|e| e.name.clone()).collect()
        }
    }

    impl AnalyticsSink for RecordingSink {
        fn track(&self, event: &AnalyticsEvent) {
            self.events.borrow_mut().push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scroll_depth_carries_percent_value() {
        let event = AnalyticsEvent::scroll_depth(75);
        assert_eq!(event.name, "scroll_depth");
        assert_eq!(event.value, Some(75));
    }

    #[test]
    fn test_event_serializes_as_tuple_fields() {
        let event = AnalyticsEvent::accepted("3.2");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["name"], "terms_accepted");
        assert_eq!(json["label"], "3.2");
        assert_eq!(json["value"], serde_json::Value::Null);
    }
}
