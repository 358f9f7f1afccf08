//! WASM bindings for the terms-acceptance page
//!
//! This module provides a stateful, session-based API for the Terms &
//! Conditions page. All state is held in Rust; JavaScript only forwards
//! DOM events and applies the returned view updates.
//!
//! ## Architecture
//!
//! - Consent state machine, scroll-spy, and engagement tracking in Rust
//!   via `TermsPageSession` (backed by `consent-engine`)
//! - Decision persistence in `localStorage` in Rust
//! - JavaScript handles only geometry measurement, event wiring, and
//!   class/text mutation
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { TermsPageSession } from './pkg/terms_wasm.js';
//!
//! await init();
//!
//! const session = new TermsPageSession("3.2", (name, category, label, value) =>
//!     console.log('[analytics]', name, category, label, value));
//! session.setNoticeCallback((message, kind) => showToast(message, kind));
//! session.setSections(measureSections());
//!
//! window.addEventListener('scroll', () => {
//!     const update = session.onScroll(window.scrollY, window.innerHeight, 80);
//!     if (update.active_changed) highlightNav(update.active);
//! });
//!
//! agreeCheckbox.addEventListener('change', e => session.setAgreement(e.target.checked));
//! acceptButton.addEventListener('click', () => session.accept());
//! declineButton.addEventListener('click', () =>
//!     session.decline(confirm('Decline the terms?')));
//!
//! setInterval(() => session.tick((Date.now() - start) / 1000), 5000);
//! window.addEventListener('beforeunload', () => session.finish());
//! ```

pub mod analytics;
pub mod session;
pub mod storage;

use wasm_bindgen::prelude::*;

pub use session::TermsPageSession;
pub use storage::LocalStore;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
