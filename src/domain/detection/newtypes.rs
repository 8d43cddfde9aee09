// SPDX-License-Identifier: MPL-2.0
//! Detection newtypes.
//!
//! Type-safe wrappers for request identifiers, probabilities and the
//! hysteresis threshold band.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::model::FALLBACK_THRESHOLD;

// =============================================================================
// RequestId
// =============================================================================

/// Identifier of one inference request, unique per coordinator lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Returns the id following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Probability
// =============================================================================

/// Ad probability, guaranteed to be within `[0, 1]`.
///
/// Non-finite inputs collapse to `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Probability(f64);

impl Probability {
    /// Creates a probability, clamping to the unit interval.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Formats the probability as a percentage with one decimal.
    #[must_use]
    pub fn percent(self) -> String {
        format!("{:.1}%", self.0 * 100.0)
    }
}

// =============================================================================
// Thresholds
// =============================================================================

/// Distance between the calibrated threshold and each hysteresis edge.
pub const HYSTERESIS_MARGIN: f64 = 0.05;

/// Decision thresholds derived from a model's calibrated threshold.
///
/// `high` must be reached to raise the ad state, and the state is kept until
/// the smoothed value drops below `low`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    default: f64,
    high: f64,
    low: f64,
}

impl Thresholds {
    /// Builds the band `default ± HYSTERESIS_MARGIN`.
    #[must_use]
    pub fn from_default(default: f64) -> Self {
        Self {
            default,
            high: default + HYSTERESIS_MARGIN,
            low: default - HYSTERESIS_MARGIN,
        }
    }

    /// Calibrated threshold, used when no smoothed history exists.
    #[must_use]
    pub fn default_threshold(self) -> f64 {
        self.default
    }

    #[must_use]
    pub fn high(self) -> f64 {
        self.high
    }

    #[must_use]
    pub fn low(self) -> f64 {
        self.low
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_default(FALLBACK_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_abs_diff_eq, F64_EPSILON};

    #[test]
    fn request_ids_increase() {
        let id = RequestId::new(41);
        assert_eq!(id.next().value(), 42);
        assert!(id < id.next());
        assert_eq!(id.to_string(), "#41");
    }

    #[test]
    fn probability_clamps() {
        assert_eq!(Probability::new(1.7).value(), 1.0);
        assert_eq!(Probability::new(-0.2).value(), 0.0);
        assert_eq!(Probability::new(f64::NAN).value(), 0.0);
        assert_eq!(Probability::new(0.25).value(), 0.25);
    }

    #[test]
    fn probability_formats_percent() {
        assert_eq!(Probability::new(0.6123).percent(), "61.2%");
    }

    #[test]
    fn thresholds_band_around_default() {
        let t = Thresholds::from_default(0.5);
        assert_abs_diff_eq!(t.default_threshold(), 0.5, epsilon = F64_EPSILON);
        assert_abs_diff_eq!(t.high(), 0.55, epsilon = F64_EPSILON);
        assert_abs_diff_eq!(t.low(), 0.45, epsilon = F64_EPSILON);
    }

    #[test]
    fn thresholds_default_uses_fallback() {
        assert_eq!(Thresholds::default(), Thresholds::from_default(FALLBACK_THRESHOLD));
    }
}
