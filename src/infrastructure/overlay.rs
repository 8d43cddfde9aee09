// SPDX-License-Identifier: MPL-2.0
//! Overlay renderer that reports through the log.
//!
//! Stands in for the on-screen marker when running headless: a transition to
//! visible logs the "AD DETECTED" banner with the confidence badge, refreshes
//! while visible log at debug level, and hiding logs once.

use crate::application::port::OverlayRenderer;
use crate::domain::detection::{Decision, Probability};

#[derive(Debug, Default)]
pub struct LogOverlay {
    visible: bool,
    shown: usize,
}

impl LogOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of hidden-to-visible transitions so far.
    #[must_use]
    pub fn times_shown(&self) -> usize {
        self.shown
    }
}

/// Text of the confidence badge, e.g. `61.2% [#ff4d4d]`.
#[must_use]
pub fn badge(decision: &Decision) -> String {
    format!(
        "{} [{}]",
        Probability::new(decision.confidence).percent(),
        decision.tier().color()
    )
}

impl OverlayRenderer for LogOverlay {
    fn show(&mut self, decision: &Decision, model_id: Option<&str>) {
        let model = model_id.unwrap_or("Unknown");
        if self.visible {
            log::debug!("Ad overlay refreshed: {} (Model: {model})", badge(decision));
        } else {
            log::info!("AD DETECTED - confidence {} (Model: {model})", badge(decision));
            self.shown += 1;
        }
        self.visible = true;
    }

    fn hide(&mut self) {
        if self.visible {
            log::info!("Ad overlay hidden");
        }
        self.visible = false;
    }
}
