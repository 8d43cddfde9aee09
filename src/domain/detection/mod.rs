// SPDX-License-Identifier: MPL-2.0
//! Detection domain: request identity, probability smoothing and the
//! hysteresis decision.

mod decision;
mod history;
mod newtypes;

pub use decision::{ConfidenceTier, Decision, DecisionEngine};
pub use history::{ProbabilityHistory, HISTORY_CAPACITY};
pub use newtypes::{Probability, RequestId, Thresholds, HYSTERESIS_MARGIN};
