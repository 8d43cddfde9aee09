// SPDX-License-Identifier: MPL-2.0
//! Overlay renderer port definition.
//!
//! The renderer only displays; it holds no detection logic. The coordinator
//! calls `show` on every positive decision (to refresh the confidence badge)
//! and `hide` when the decision turns negative or detection stops.

use crate::domain::detection::Decision;

/// Port for the visual ad marker.
pub trait OverlayRenderer: Send {
    /// Shows the marker, or refreshes it when already shown.
    fn show(&mut self, decision: &Decision, model_id: Option<&str>);

    /// Removes the marker. Must be harmless when nothing is shown.
    fn hide(&mut self);
}
