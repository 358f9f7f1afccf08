//! Terms-acceptance core logic
//!
//! This crate provides the environment-free core of the terms page:
//! versioned consent persistence behind a pluggable store, the consent UI
//! state machine, scroll-spy section tracking, and scroll-depth/time
//! engagement milestones reported through a pluggable analytics sink.
//!
//! Nothing here touches a DOM or a clock; the browser layer feeds in
//! section geometries, scroll positions, and tick timestamps, and reads
//! back the derived state.

pub mod analytics;
pub mod consent;
pub mod engagement;
pub mod error;
pub mod machine;
pub mod scroll;
pub mod store;

use serde::{Deserialize, Serialize};

pub use analytics::{AnalyticsEvent, AnalyticsSink, NullSink, TracingSink};
pub use consent::{load_decision, record_decision, ConsentRecord, Decision};
pub use engagement::{DepthThresholds, EngagementClock, DEPTH_THRESHOLDS, TIME_MARKS};
pub use error::{ConsentError, StoreError};
pub use machine::ConsentPhase;
pub use scroll::{compute_active_section, ScrollProgress, SectionGeometry};
pub use store::{ConsentStore, MemoryStore};

/// Result of applying one scroll event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollUpdate {
    /// Section currently in view, if any.
    pub active: Option<String>,
    /// Whether `active` changed relative to the previous scroll event.
    pub active_changed: bool,
    /// Percentage of sections viewed so far.
    pub percent: u8,
}

/// Visit summary exposed to the page's own reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSummary {
    pub percent_viewed: u8,
    pub seconds_on_page: u32,
    pub decision: Option<Decision>,
}

/// Owns the consent state, the scroll-derived active-section pointer, and
/// the monotonic viewed-section set for one page visit.
///
/// The store persists across visits; everything else is per-visit state
/// discarded on navigation.
pub struct AcceptanceTracker<S: ConsentStore> {
    store: S,
    version: String,
    phase: ConsentPhase,
    record: Option<ConsentRecord>,
    sections: Vec<SectionGeometry>,
    progress: ScrollProgress,
    thresholds: DepthThresholds,
    clock: EngagementClock,
    active: Option<String>,
    finished: bool,
    sink: Box<dyn AnalyticsSink>,
}

impl<S: ConsentStore> AcceptanceTracker<S> {
    /// Create a tracker for the given document version, resuming any prior
    /// decision recorded for that exact version. Emits the page-view event.
    pub fn new(store: S, version: &str, sink: Box<dyn AnalyticsSink>) -> Self {
        let record = load_decision(&store, version);
        let phase = ConsentPhase::resume(record.as_ref());
        sink.track(&AnalyticsEvent::page_view(version));
        Self {
            store,
            version: version.to_string(),
            phase,
            record,
            sections: Vec::new(),
            progress: ScrollProgress::new(),
            thresholds: DepthThresholds::new(),
            clock: EngagementClock::new(),
            active: None,
            finished: false,
            sink,
        }
    }

    /// Tracker with the structured-logging sink.
    pub fn with_store(store: S, version: &str) -> Self {
        Self::new(store, version, Box::new(TracingSink))
    }

    pub fn phase(&self) -> ConsentPhase {
        self.phase
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn record(&self) -> Option<&ConsentRecord> {
        self.record.as_ref()
    }

    pub fn active_section(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Replace the section layout, e.g. after a resize re-measure. Viewed
    /// state is retained; ids that vanished simply stop matching.
    pub fn set_sections(&mut self, sections: Vec<SectionGeometry>) {
        self.sections = sections;
    }

    /// Apply one scroll event in delivery order: recompute the active
    /// section and fold the position into the viewed set, emitting
    /// section-view and scroll-depth events as milestones are reached.
    pub fn handle_scroll(
        &mut self,
        scroll_y: f64,
        viewport_height: f64,
        header_offset: f64,
    ) -> ScrollUpdate {
        let active = compute_active_section(&self.sections, scroll_y, header_offset)
            .map(str::to_string);
        let active_changed = active != self.active;
        if active_changed {
            if let Some(id) = &active {
                self.sink.track(&AnalyticsEvent::section_view(id));
            }
            self.active = active.clone();
        }

        let percent = self.progress.update(&self.sections, scroll_y, viewport_height);
        for threshold in self.thresholds.crossings(percent) {
            self.sink.track(&AnalyticsEvent::scroll_depth(threshold));
        }

        ScrollUpdate {
            active,
            active_changed,
            percent,
        }
    }

    /// Advance the engagement clock, emitting one time-on-page event per
    /// newly passed mark.
    pub fn tick(&mut self, seconds_on_page: u32) {
        for mark in self.clock.tick(seconds_on_page) {
            self.sink.track(&AnalyticsEvent::time_on_page(mark));
        }
    }

    /// Apply the agreement-checkbox state.
    pub fn set_agreement(&mut self, checked: bool) -> Result<ConsentPhase, ConsentError> {
        self.phase = self.phase.set_agreement(checked)?;
        Ok(self.phase)
    }

    /// Start the accept task. The caller performs whatever latency or I/O
    /// the task involves, then settles it with [`commit_accept`].
    ///
    /// [`commit_accept`]: AcceptanceTracker::commit_accept
    pub fn begin_accept(&mut self) -> Result<(), ConsentError> {
        self.phase = self.phase.begin_accept()?;
        Ok(())
    }

    /// Settle the pending accept task by persisting the decision. On a
    /// store failure the machine returns to `ReadyToAccept` and the error
    /// is surfaced as retryable.
    pub fn commit_accept(&mut self) -> Result<ConsentRecord, ConsentError> {
        if self.phase != ConsentPhase::AcceptedPending {
            return Err(ConsentError::InvalidTransition {
                phase: self.phase.as_str(),
                event: "settle accept",
            });
        }
        match record_decision(&mut self.store, Decision::Accepted, &self.version) {
            Ok(record) => {
                self.phase = self.phase.settle_accept(true)?;
                self.record = Some(record.clone());
                self.sink.track(&AnalyticsEvent::accepted(&self.version));
                Ok(record)
            }
            Err(err) => {
                self.phase = self.phase.settle_accept(false)?;
                self.sink
                    .track(&AnalyticsEvent::accept_retry_shown(&self.version));
                Err(err)
            }
        }
    }

    /// Decline the terms after the confirmation dialog. A store failure
    /// leaves the phase unchanged so the viewer can try again.
    pub fn decline(&mut self, confirmed: bool) -> Result<ConsentRecord, ConsentError> {
        let next = self.phase.decline(confirmed)?;
        let record = record_decision(&mut self.store, Decision::Declined, &self.version)?;
        self.phase = next;
        self.record = Some(record.clone());
        self.sink.track(&AnalyticsEvent::declined(&self.version));
        Ok(record)
    }

    /// Flush the visit on unload: emits a final time-on-page event with the
    /// accumulated seconds and returns the visit summary. Idempotent;
    /// repeated calls emit nothing further.
    pub fn finish(&mut self) -> EngagementSummary {
        if !self.finished {
            self.finished = true;
            if self.clock.seconds() > 0 {
                self.sink
                    .track(&AnalyticsEvent::time_on_page(self.clock.seconds()));
            }
        }
        self.summary()
    }

    /// Snapshot of the visit for the page's own reporting.
    pub fn summary(&self) -> EngagementSummary {
        EngagementSummary {
            percent_viewed: self.progress.percent(&self.sections),
            seconds_on_page: self.clock.seconds(),
            decision: self.record.as_ref().map(|r| {
                if r.accepted {
                    Decision::Accepted
                } else {
                    Decision::Declined
                }
            }),
        }
    }

    /// Consume the tracker and hand back the store, e.g. to reuse it for
    /// the next page load in tests.
    pub fn into_store(self) -> S {
        self.store
    }
}
