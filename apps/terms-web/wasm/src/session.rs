//! Stateful terms-page session
//!
//! Holds the acceptance tracker for one page visit and exposes it to
//! JavaScript. Scroll positions, geometry, and timer ticks are pushed in;
//! view updates come back as plain objects, and the accept task settles
//! through the registered callbacks.
//!
//! Analytics events are buffered while the tracker runs and dispatched
//! only after the session borrow is released, so every callback — toast,
//! decision, analytics — may safely re-enter the session.

use std::cell::RefCell;
use std::rc::Rc;

use consent_engine::{
    AcceptanceTracker, ConsentError, ConsentPhase, ConsentRecord, SectionGeometry,
};
use gloo_timers::future::TimeoutFuture;
use js_sys::Function;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::analytics::{dispatch_pending, BufferedSink, EventBuffer, SharedCallback};
use crate::storage::LocalStore;

/// Simulated persist latency so the control can show pending feedback.
const ACCEPT_LATENCY_MS: u32 = 600;

struct SessionInner {
    tracker: AcceptanceTracker<LocalStore>,
    notice: Option<Function>,
    decided: Option<Function>,
}

/// Session-based API for the Terms & Conditions page.
#[wasm_bindgen]
pub struct TermsPageSession {
    inner: Rc<RefCell<SessionInner>>,
    analytics: SharedCallback,
    buffer: EventBuffer,
}

/// Invoke the toast surface. Called with no session borrow held so a
/// callback may re-enter the session.
fn notify(notice: &Option<Function>, message: &str, kind: &str) {
    if let Some(callback) = notice {
        let _ = callback.call2(
            &JsValue::NULL,
            &JsValue::from_str(message),
            &JsValue::from_str(kind),
        );
    }
}

/// Report a settled decision (phase string plus the record) to the page.
fn announce(decided: &Option<Function>, phase: ConsentPhase, record: &ConsentRecord) {
    if let Some(callback) = decided {
        let record = serde_wasm_bindgen::to_value(record).unwrap_or(JsValue::NULL);
        let _ = callback.call2(&JsValue::NULL, &JsValue::from_str(phase.as_str()), &record);
    }
}

#[wasm_bindgen]
impl TermsPageSession {
    /// Create a session for the given document version, resuming any prior
    /// decision recorded for that exact version. The analytics transport is
    /// taken here so the page-view event emitted on construction reaches
    /// it; pass `null` to fall back to console logging.
    /// Callback signature: `(name, category, label, value) => void`
    #[wasm_bindgen(constructor)]
    pub fn new(version: &str, analytics: Option<Function>) -> Result<TermsPageSession, JsValue> {
        let store = LocalStore::new().map_err(|e| JsValue::from_str(&e.to_string()))?;
        let buffer: EventBuffer = Rc::new(RefCell::new(Vec::new()));
        let analytics: SharedCallback = Rc::new(RefCell::new(analytics));
        let sink = BufferedSink::new(Rc::clone(&buffer));
        let tracker = AcceptanceTracker::new(store, version, Box::new(sink));
        dispatch_pending(&buffer, &analytics);
        Ok(Self {
            inner: Rc::new(RefCell::new(SessionInner {
                tracker,
                notice: None,
                decided: None,
            })),
            analytics,
            buffer,
        })
    }

    /// Register the toast surface.
    /// Callback signature: `(message: string, kind: string) => void`
    #[wasm_bindgen(js_name = setNoticeCallback)]
    pub fn set_notice_callback(&self, callback: Function) {
        self.inner.borrow_mut().notice = Some(callback);
    }

    /// Replace the analytics transport registered at construction.
    #[wasm_bindgen(js_name = setAnalyticsCallback)]
    pub fn set_analytics_callback(&self, callback: Function) {
        *self.analytics.borrow_mut() = Some(callback);
        dispatch_pending(&self.buffer, &self.analytics);
    }

    /// Register the decision handler, invoked whenever a decision settles.
    /// Callback signature: `(phase: string, record: object) => void`
    #[wasm_bindgen(js_name = setDecisionCallback)]
    pub fn set_decision_callback(&self, callback: Function) {
        self.inner.borrow_mut().decided = Some(callback);
    }

    /// Current consent phase as a string
    /// (`undecided`, `ready_to_accept`, `accepted_pending`, `accepted`, `declined`).
    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        self.inner.borrow().tracker.phase().as_str().to_string()
    }

    /// Section currently in view, if any.
    #[wasm_bindgen(getter, js_name = activeSection)]
    pub fn active_section(&self) -> Option<String> {
        self.inner
            .borrow()
            .tracker
            .active_section()
            .map(str::to_string)
    }

    /// Whether the decision controls should be disabled: a final decision
    /// exists or the persist is in flight.
    #[wasm_bindgen(getter, js_name = isDecided)]
    pub fn is_decided(&self) -> bool {
        let phase = self.inner.borrow().tracker.phase();
        phase.is_terminal() || phase == ConsentPhase::AcceptedPending
    }

    /// Replace the section layout with freshly measured geometries.
    /// Expects `[{ id, top, height }, ...]` in document order; sections
    /// whose anchor element no longer exists are omitted by the measuring
    /// side and simply drop out of tracking.
    #[wasm_bindgen(js_name = setSections)]
    pub fn set_sections(&self, sections: JsValue) -> Result<(), JsValue> {
        let sections: Vec<SectionGeometry> = serde_wasm_bindgen::from_value(sections)
            .map_err(|e| JsValue::from_str(&format!("Invalid section geometry: {}", e)))?;
        self.inner.borrow_mut().tracker.set_sections(sections);
        Ok(())
    }

    /// Apply one scroll event. Returns `{ active, active_changed, percent }`.
    #[wasm_bindgen(js_name = onScroll)]
    pub fn on_scroll(
        &self,
        scroll_y: f64,
        viewport_height: f64,
        header_offset: f64,
    ) -> Result<JsValue, JsValue> {
        let update =
            self.inner
                .borrow_mut()
                .tracker
                .handle_scroll(scroll_y, viewport_height, header_offset);
        dispatch_pending(&self.buffer, &self.analytics);
        serde_wasm_bindgen::to_value(&update)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Advance the engagement clock. Driven by a page interval that the
    /// page clears on unload.
    pub fn tick(&self, seconds_on_page: u32) {
        self.inner.borrow_mut().tracker.tick(seconds_on_page);
        dispatch_pending(&self.buffer, &self.analytics);
    }

    /// Apply the agreement-checkbox state.
    #[wasm_bindgen(js_name = setAgreement)]
    pub fn set_agreement(&self, checked: bool) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .tracker
            .set_agreement(checked)
            .map(|_| ())
            .map_err(to_js)
    }

    /// Start the accept task: the phase moves to `accepted_pending`, and
    /// after the simulated latency the decision is persisted. The outcome
    /// arrives through the decision and notice callbacks; a storage failure
    /// returns the phase to `ready_to_accept` with a retryable error toast.
    pub fn accept(&self) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .tracker
            .begin_accept()
            .map_err(to_js)?;

        let inner = Rc::clone(&self.inner);
        let analytics = Rc::clone(&self.analytics);
        let buffer = Rc::clone(&self.buffer);
        spawn_local(async move {
            TimeoutFuture::new(ACCEPT_LATENCY_MS).await;

            let (outcome, notice, decided) = {
                let mut session = inner.borrow_mut();
                (
                    session.tracker.commit_accept(),
                    session.notice.clone(),
                    session.decided.clone(),
                )
            };
            dispatch_pending(&buffer, &analytics);
            match outcome {
                Ok(record) => {
                    notify(&notice, "Terms accepted. Thank you.", "success");
                    announce(&decided, ConsentPhase::Accepted, &record);
                }
                Err(err) => {
                    notify(
                        &notice,
                        &format!("Could not save your acceptance: {}. Please try again.", err),
                        "error",
                    );
                }
            }
        });
        Ok(())
    }

    /// Decline the terms. `confirmed` is the result of the page's
    /// confirmation dialog; an unconfirmed decline is a no-op.
    pub fn decline(&self, confirmed: bool) -> Result<(), JsValue> {
        let (result, notice, decided) = {
            let mut session = self.inner.borrow_mut();
            (
                session.tracker.decline(confirmed),
                session.notice.clone(),
                session.decided.clone(),
            )
        };
        dispatch_pending(&self.buffer, &self.analytics);
        match result {
            Ok(record) => {
                notify(&notice, "You have declined the terms.", "info");
                announce(&decided, ConsentPhase::Declined, &record);
                Ok(())
            }
            Err(ConsentError::DeclineNotConfirmed) => Ok(()),
            Err(err) => {
                if err.is_retryable() {
                    notify(
                        &notice,
                        &format!("Could not save your decision: {}. Please try again.", err),
                        "error",
                    );
                }
                Err(to_js(err))
            }
        }
    }

    /// Visit snapshot: `{ percent_viewed, seconds_on_page, decision }`.
    pub fn summary(&self) -> Result<JsValue, JsValue> {
        let summary = self.inner.borrow().tracker.summary();
        serde_wasm_bindgen::to_value(&summary)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Flush the visit on `beforeunload` and return the final summary.
    /// Idempotent.
    pub fn finish(&self) -> Result<JsValue, JsValue> {
        let summary = self.inner.borrow_mut().tracker.finish();
        dispatch_pending(&self.buffer, &self.analytics);
        serde_wasm_bindgen::to_value(&summary)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

fn to_js(err: ConsentError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
