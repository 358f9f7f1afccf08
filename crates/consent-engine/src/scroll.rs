//! Scroll-spy computation and scroll-depth progress
//!
//! Section geometries are supplied by the caller (in the browser, measured
//! from the live DOM), so everything here is pure and testable with
//! synthetic layouts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Vertical span of one named content block, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionGeometry {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl SectionGeometry {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }
}

/// First section, in document order, whose span contains the adjusted
/// scroll position. `None` above the first section or below the last.
pub fn compute_active_section(
    sections: &[SectionGeometry],
    scroll_y: f64,
    header_offset: f64,
) -> Option<&str> {
    let probe = scroll_y + header_offset;
    sections
        .iter()
        .find(|s| s.top <= probe && probe < s.top + s.height)
        .map(|s| s.id.as_str())
}

/// Set of sections the viewer has scrolled past at least halfway.
/// Grows monotonically within a page visit; discarded on navigation.
#[derive(Debug, Default, Clone)]
pub struct ScrollProgress {
    viewed: BTreeSet<String>,
}

impl ScrollProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every section whose midpoint has entered the viewport as viewed
    /// and return the resulting percentage, rounded to the nearest integer.
    pub fn update(
        &mut self,
        sections: &[SectionGeometry],
        scroll_y: f64,
        viewport_height: f64,
    ) -> u8 {
        let bottom = scroll_y + viewport_height;
        for section in sections {
            if section.top + section.height * 0.5 < bottom {
                self.viewed.insert(section.id.clone());
            }
        }
        self.percent(sections)
    }

    /// Percentage of the given sections viewed so far, rounded to the
    /// nearest integer. Only ids present in the current layout count, so
    /// the result stays within 0..=100 after a layout shrinks.
    pub fn percent(&self, sections: &[SectionGeometry]) -> u8 {
        if sections.is_empty() {
            return 0;
        }
        let viewed = sections
            .iter()
            .filter(|s| self.viewed.contains(s.id.as_str()))
            .count();
        (viewed as f64 / sections.len() as f64 * 100.0).round() as u8
    }

    pub fn viewed_count(&self) -> usize {
        self.viewed.len()
    }

    pub fn has_viewed(&self, id: &str) -> bool {
        self.viewed.contains(id)
    }
}
