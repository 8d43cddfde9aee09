// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons and fake collaborators.
//!
//! This module re-exports the `approx` crate's assertion macros for float comparison,
//! which properly handle floating-point precision issues that `assert_eq!` cannot.

// Re-export approx macros for convenient use in tests
pub use approx::{assert_abs_diff_eq, assert_abs_diff_ne, assert_relative_eq, assert_relative_ne};

use crate::application::port::{
    OverlayRenderer, VideoEvent, VideoEventStream, VideoId, VideoListeners, VideoSource,
};
use crate::domain::detection::Decision;
use crate::domain::frame::RgbaFrame;
use crate::error::DetectionError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Default epsilon for f32 comparisons.
/// Suitable for values that should be "exactly equal" but may have minor floating-point errors.
pub const F32_EPSILON: f32 = 1e-6;

/// Default epsilon for f64 comparisons.
/// Suitable for values that should be "exactly equal" but may have minor floating-point errors.
pub const F64_EPSILON: f64 = 1e-10;

/// In-memory video whose playback state is set by the test.
pub struct FakeVideo {
    id: VideoId,
    frame: RgbaFrame,
    ready: AtomicBool,
    paused: AtomicBool,
    ended: AtomicBool,
    attached: AtomicBool,
    captures: AtomicUsize,
    listeners: VideoListeners,
}

impl FakeVideo {
    /// A playing, ready video that always shows `frame`.
    pub fn new(frame: RgbaFrame) -> Arc<Self> {
        Arc::new(Self {
            id: VideoId::next(),
            frame,
            ready: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            attached: AtomicBool::new(true),
            captures: AtomicUsize::new(0),
            listeners: VideoListeners::new(),
        })
    }

    pub fn playing() -> Arc<Self> {
        Self::new(RgbaFrame::solid(32, 18, [200, 40, 40, 255]))
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn set_ended(&self, ended: bool) {
        self.ended.store(ended, Ordering::SeqCst);
    }

    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn emit(&self, event: VideoEvent) {
        self.listeners.emit(event);
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.active()
    }
}

impl VideoSource for FakeVideo {
    fn id(&self) -> VideoId {
        self.id
    }

    fn has_current_data(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn capture(&self) -> Result<RgbaFrame, DetectionError> {
        if !self.has_current_data() {
            return Err(DetectionError::NotReady);
        }
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }

    fn subscribe(&self) -> VideoEventStream {
        self.listeners.subscribe()
    }
}

/// A call made on a [`RecordingOverlay`].
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCall {
    Show { confidence: f64 },
    Hide,
}

/// Overlay that records every call. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingOverlay {
    calls: Arc<Mutex<Vec<OverlayCall>>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<OverlayCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Returns true when the last call was a show.
    pub fn is_showing(&self) -> bool {
        matches!(self.calls().last(), Some(OverlayCall::Show { .. }))
    }

    pub fn hides(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, OverlayCall::Hide))
            .count()
    }
}

impl OverlayRenderer for RecordingOverlay {
    fn show(&mut self, decision: &Decision, _model_id: Option<&str>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(OverlayCall::Show {
                confidence: decision.confidence,
            });
        }
    }

    fn hide(&mut self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(OverlayCall::Hide);
        }
    }
}
