// SPDX-License-Identifier: MPL-2.0
//! Frame sampling from a live video source.
//!
//! A pass draws `count` frames, scales each one to the model input size and
//! converts it to the channel-planar `[-1, 1]` layout. Temporal models get
//! the same presentation frame drawn repeatedly with a short pause between
//! draws; there is no multi-timestamp capture.

use crate::application::port::VideoSource;
use crate::domain::frame::{FrameBatch, PlanarFrame, RgbaFrame, FRAME_SIZE};
use crate::error::DetectionError;
use image_rs::imageops::{self, FilterType};
use image_rs::RgbaImage;
use std::time::Duration;

/// Default pause between consecutive draws of a multi-frame pass.
pub const DEFAULT_CAPTURE_DELAY: Duration = Duration::from_millis(5);

/// Draws frame batches from a [`VideoSource`].
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    capture_delay: Duration,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_DELAY)
    }
}

impl FrameSampler {
    #[must_use]
    pub fn new(capture_delay: Duration) -> Self {
        Self { capture_delay }
    }

    #[must_use]
    pub fn capture_delay(&self) -> Duration {
        self.capture_delay
    }

    /// Captures `count` frames (at least one) from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::NotReady`] when the source has no current
    /// data or a frame cannot be read back.
    pub async fn sample(
        &self,
        source: &dyn VideoSource,
        count: usize,
    ) -> Result<FrameBatch, DetectionError> {
        if !source.has_current_data() {
            return Err(DetectionError::NotReady);
        }

        let count = count.max(1);
        let mut frames = Vec::with_capacity(count);
        for i in 0..count {
            let raw = source.capture()?;
            frames.push(to_planar(raw).ok_or(DetectionError::NotReady)?);

            if i + 1 < count {
                tokio::time::sleep(self.capture_delay).await;
            }
        }
        Ok(FrameBatch::new(frames))
    }
}

/// Scales a captured frame to the model size and normalizes it.
#[must_use]
pub fn to_planar(frame: RgbaFrame) -> Option<PlanarFrame> {
    let frame = if frame.is_model_sized() {
        frame
    } else {
        scale_to_model(frame)?
    };
    PlanarFrame::from_rgba(&frame)
}

fn scale_to_model(frame: RgbaFrame) -> Option<RgbaFrame> {
    let (width, height) = (frame.width(), frame.height());
    let image = RgbaImage::from_raw(width, height, frame.into_raw())?;
    let scaled = imageops::resize(&image, FRAME_SIZE, FRAME_SIZE, FilterType::Triangle);
    RgbaFrame::new(FRAME_SIZE, FRAME_SIZE, scaled.into_raw())
}
