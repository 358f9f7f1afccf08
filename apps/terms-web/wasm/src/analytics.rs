//! Analytics forwarding to JavaScript
//!
//! Tracker calls run while the session's `RefCell` is borrowed, so the
//! sink never calls into JavaScript directly: events land in a shared
//! buffer and the session flushes them once the borrow is released. The
//! real transport is whatever the page registers; without one, events
//! land in the browser console, the no-op logger stand-in.

use std::cell::RefCell;
use std::rc::Rc;

use consent_engine::{AnalyticsEvent, AnalyticsSink};
use js_sys::Function;
use wasm_bindgen::JsValue;

/// Callback slot shared between the session and its flush points so the
/// page can swap the transport at any time.
pub type SharedCallback = Rc<RefCell<Option<Function>>>;

/// Events emitted during a tracker call, awaiting dispatch.
pub type EventBuffer = Rc<RefCell<Vec<AnalyticsEvent>>>;

/// Sink that buffers events instead of dispatching them. Safe to call
/// from inside any session borrow; never re-enters JavaScript.
pub struct BufferedSink {
    buffer: EventBuffer,
}

impl BufferedSink {
    pub fn new(buffer: EventBuffer) -> Self {
        Self { buffer }
    }
}

impl AnalyticsSink for BufferedSink {
    fn track(&self, event: &AnalyticsEvent) {
        self.buffer.borrow_mut().push(event.clone());
    }
}

/// Drain the buffer and hand each event to the registered callback, or to
/// `console.debug` when none is registered. Both `RefCell`s are released
/// before any JavaScript runs, so a handler may re-enter the session or
/// re-register the transport.
pub fn dispatch_pending(buffer: &EventBuffer, callback: &SharedCallback) {
    let callback = callback.borrow().clone();
    let pending: Vec<AnalyticsEvent> = buffer.borrow_mut().drain(..).collect();
    for event in &pending {
        dispatch(callback.as_ref(), event);
    }
}

fn dispatch(callback: Option<&Function>, event: &AnalyticsEvent) {
    let value = event
        .value
        .map(|v| JsValue::from_f64(v as f64))
        .unwrap_or(JsValue::NULL);

    if let Some(callback) = callback {
        let args = js_sys::Array::of4(
            &JsValue::from_str(&event.name),
            &JsValue::from_str(&event.category),
            &JsValue::from_str(&event.label),
            &value,
        );
        // A throwing callback must never break the page; drop the event.
        if callback.apply(&JsValue::NULL, &args).is_ok() {
            return;
        }
    }

    web_sys::console::debug_4(
        &JsValue::from_str(&format!("[analytics] {}", event.name)),
        &JsValue::from_str(&event.category),
        &JsValue::from_str(&event.label),
        &value,
    );
}
