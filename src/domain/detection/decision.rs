// SPDX-License-Identifier: MPL-2.0
//! Smoothing and hysteresis decision logic.
//!
//! Per-frame probabilities are noisy. The engine averages the recent history
//! and compares the mean against an asymmetric band: entering the ad state
//! requires the high edge, leaving it requires dropping below the low edge.

use super::history::ProbabilityHistory;
use super::newtypes::{Probability, Thresholds};

/// Outcome of one smoothing step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub is_ad: bool,
    /// The value that was compared against the threshold.
    pub confidence: f64,
}

impl Decision {
    /// Decision used before any observation.
    #[must_use]
    pub const fn not_ad() -> Self {
        Self {
            is_ad: false,
            confidence: 0.0,
        }
    }

    #[must_use]
    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_confidence(self.confidence)
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::not_ad()
    }
}

/// Coarse confidence bucket shown next to the ad marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    /// Above 30%.
    High,
    /// Above 20%.
    Elevated,
    Moderate,
}

impl ConfidenceTier {
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.3 {
            ConfidenceTier::High
        } else if confidence > 0.2 {
            ConfidenceTier::Elevated
        } else {
            ConfidenceTier::Moderate
        }
    }

    /// Badge colour as a CSS-style hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            ConfidenceTier::High => "#ff4d4d",
            ConfidenceTier::Elevated => "#ff9933",
            ConfidenceTier::Moderate => "#ffcc00",
        }
    }
}

/// Moving-average smoother with hysteresis.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    history: ProbabilityHistory,
    thresholds: Thresholds,
    last_probability: f64,
}

impl DecisionEngine {
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            history: ProbabilityHistory::new(),
            thresholds,
            last_probability: 0.0,
        }
    }

    /// Records a successful probability and returns the smoothed decision.
    ///
    /// `overlay_visible` selects the hysteresis edge: while the marker is
    /// shown the low edge applies, otherwise the high edge.
    pub fn observe(&mut self, probability: Probability, overlay_visible: bool) -> Decision {
        self.last_probability = probability.value();
        self.history.push(probability.value());
        self.evaluate(overlay_visible)
    }

    /// Computes the decision from the current state without recording anything.
    ///
    /// With an empty history the last known probability is compared against
    /// the plain calibrated threshold.
    #[must_use]
    pub fn evaluate(&self, overlay_visible: bool) -> Decision {
        let Some(mean) = self.history.mean() else {
            return Decision {
                is_ad: self.last_probability >= self.thresholds.default_threshold(),
                confidence: self.last_probability,
            };
        };

        let edge = if overlay_visible {
            self.thresholds.low()
        } else {
            self.thresholds.high()
        };

        Decision {
            is_ad: mean >= edge,
            confidence: mean,
        }
    }

    /// Replaces the threshold band. History is kept.
    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    #[must_use]
    pub fn history(&self) -> &ProbabilityHistory {
        &self.history
    }

    #[must_use]
    pub fn last_probability(&self) -> f64 {
        self.last_probability
    }

    /// Drops all smoothing state.
    pub fn reset_history(&mut self) {
        self.history.clear();
    }
}
