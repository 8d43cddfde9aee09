// SPDX-License-Identifier: MPL-2.0
//! Video source port definition.
//!
//! A [`VideoSource`] is the live element detection is bound to: it reports
//! playback state, hands out the current presentation frame and publishes
//! play/pause/seek events to subscribers. A [`VideoLocator`] finds the main
//! video on the page.
//!
//! # Design Notes
//!
//! - Listeners are channel receivers; dropping the receiver detaches the
//!   listener, so teardown never needs an explicit remove call
//! - `capture` is synchronous; the sampler adds the inter-draw delay

use crate::domain::frame::RgbaFrame;
use crate::error::DetectionError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Identity of a video element, stable for the element's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoId(u64);

static NEXT_VIDEO_ID: AtomicU64 = AtomicU64::new(1);

impl VideoId {
    /// Allocates a process-unique id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_VIDEO_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Playback events published by a video element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEvent {
    Play,
    Pause,
    Seeked,
    Ended,
}

/// Receiving end of a listener registration.
pub type VideoEventStream = mpsc::UnboundedReceiver<VideoEvent>;

/// Port for a live video element.
pub trait VideoSource: Send + Sync {
    fn id(&self) -> VideoId;

    /// Returns true once the element has data for the current position.
    fn has_current_data(&self) -> bool;

    fn is_paused(&self) -> bool;

    fn is_ended(&self) -> bool;

    /// Returns false once the element has been removed from the page.
    fn is_attached(&self) -> bool {
        true
    }

    /// Reads back the current presentation frame.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::NotReady`] when no frame can be read.
    fn capture(&self) -> Result<RgbaFrame, DetectionError>;

    /// Registers a listener for playback events.
    fn subscribe(&self) -> VideoEventStream;
}

/// Port for discovering the video detection should bind to.
pub trait VideoLocator: Send {
    /// Returns the main video if it is present and has data.
    fn find_main_video(&self) -> Option<Arc<dyn VideoSource>>;
}

/// Listener registry for [`VideoSource`] implementations.
///
/// Closed listeners are pruned on every emit.
#[derive(Debug, Default)]
pub struct VideoListeners {
    senders: Mutex<Vec<mpsc::UnboundedSender<VideoEvent>>>,
}

impl VideoListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> VideoEventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut senders) = self.senders.lock() {
            senders.push(tx);
        }
        rx
    }

    /// Delivers an event to every live listener.
    pub fn emit(&self, event: VideoEvent) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.retain(|tx| tx.send(event).is_ok());
        }
    }

    /// Number of listeners whose receiver is still alive.
    #[must_use]
    pub fn active(&self) -> usize {
        self.senders
            .lock()
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_ids_are_unique() {
        let a = VideoId::next();
        let b = VideoId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn emit_reaches_live_listeners() {
        let listeners = VideoListeners::new();
        let mut rx = listeners.subscribe();

        listeners.emit(VideoEvent::Play);
        assert_eq!(rx.try_recv().ok(), Some(VideoEvent::Play));
    }

    #[test]
    fn dropped_listener_is_detached() {
        let listeners = VideoListeners::new();
        let rx = listeners.subscribe();
        let _kept = listeners.subscribe();
        assert_eq!(listeners.active(), 2);

        drop(rx);
        assert_eq!(listeners.active(), 1);
        listeners.emit(VideoEvent::Pause);
        assert_eq!(listeners.active(), 1);
    }
}
