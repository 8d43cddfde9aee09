// SPDX-License-Identifier: MPL-2.0
//! Frame types consumed by the inference engine.
//!
//! A captured video frame starts as an [`RgbaFrame`] of arbitrary size. The
//! sampler scales it to [`FRAME_SIZE`]×[`FRAME_SIZE`] and converts it into a
//! [`PlanarFrame`]: three channel planes (R, G, B) of `f32` values in
//! `[-1, 1]`, alpha discarded. One inference call consumes a [`FrameBatch`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length of a model input frame, in pixels.
pub const FRAME_SIZE: u32 = 224;

/// Number of values in one channel plane.
pub const PLANE_LEN: usize = (FRAME_SIZE * FRAME_SIZE) as usize;

/// Number of values in one normalized frame (three planes).
pub const FRAME_LEN: usize = 3 * PLANE_LEN;

// =============================================================================
// RgbaFrame
// =============================================================================

/// Raw 8-bit RGBA pixels as read back from a video surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaFrame {
    /// Wraps an RGBA buffer. Returns `None` when the buffer length does not
    /// match `width * height * 4` or a dimension is zero.
    #[must_use]
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a frame filled with a single colour.
    #[must_use]
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width.max(1) as usize) * (height.max(1) as usize);
        let data = rgba.iter().copied().cycle().take(pixels * 4).collect();
        Self {
            width: width.max(1),
            height: height.max(1),
            data,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the frame and returns the pixel buffer.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Returns true if the frame already has model input dimensions.
    #[must_use]
    pub fn is_model_sized(&self) -> bool {
        self.width == FRAME_SIZE && self.height == FRAME_SIZE
    }
}

// =============================================================================
// PlanarFrame
// =============================================================================

/// One normalized, channel-planar frame.
///
/// Layout is `[R plane | G plane | B plane]`, each plane row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanarFrame(Vec<f32>);

impl PlanarFrame {
    /// Normalizes a model-sized RGBA frame (`value / 127.5 - 1`).
    ///
    /// Returns `None` unless the frame is exactly `FRAME_SIZE`×`FRAME_SIZE`.
    #[must_use]
    pub fn from_rgba(frame: &RgbaFrame) -> Option<Self> {
        if !frame.is_model_sized() {
            return None;
        }
        Some(Self(normalize_rgba(frame.data())))
    }

    /// Wraps already-normalized values without validation.
    ///
    /// Use [`FrameBatch::validate`] before feeding foreign data to a model.
    #[must_use]
    pub fn from_values(values: Vec<f32>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns one channel plane (0 = R, 1 = G, 2 = B).
    #[must_use]
    pub fn plane(&self, channel: usize) -> Option<&[f32]> {
        let start = channel.checked_mul(PLANE_LEN)?;
        self.0.get(start..start + PLANE_LEN)
    }
}

/// Converts interleaved RGBA bytes into three normalized channel planes.
///
/// The output always has three planes of `rgba.len() / 4` values each.
#[must_use]
pub fn normalize_rgba(rgba: &[u8]) -> Vec<f32> {
    let pixels = rgba.len() / 4;
    let mut out = vec![0.0f32; pixels * 3];
    for (j, px) in rgba.chunks_exact(4).enumerate() {
        out[j] = f32::from(px[0]) / 127.5 - 1.0;
        out[j + pixels] = f32::from(px[1]) / 127.5 - 1.0;
        out[j + 2 * pixels] = f32::from(px[2]) / 127.5 - 1.0;
    }
    out
}

// =============================================================================
// FrameBatch
// =============================================================================

/// Why a frame batch cannot be fed to a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The batch holds no frames.
    Empty,
    /// The batch size does not match the model's frame count.
    FrameCount { expected: usize, actual: usize },
    /// A frame does not hold exactly [`FRAME_LEN`] values.
    FrameLength { index: usize, actual: usize },
    /// A frame holds NaN/inf or values outside `[-1, 1]`.
    OutOfRange { index: usize },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Empty => write!(f, "batch contains no frames"),
            PayloadError::FrameCount { expected, actual } => {
                write!(f, "model expects {expected} frames, received {actual}")
            }
            PayloadError::FrameLength { index, actual } => write!(
                f,
                "frame {index} has {actual} values, expected {FRAME_LEN}"
            ),
            PayloadError::OutOfRange { index } => {
                write!(f, "frame {index} holds values outside [-1, 1]")
            }
        }
    }
}

impl std::error::Error for PayloadError {}

/// Ordered frames for one inference call.
///
/// Immutable once built; moved into the request that carries it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameBatch(Vec<PlanarFrame>);

impl FrameBatch {
    #[must_use]
    pub fn new(frames: Vec<PlanarFrame>) -> Self {
        Self(frames)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn frames(&self) -> impl Iterator<Item = &PlanarFrame> {
        self.0.iter()
    }

    /// Total number of values across all frames.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.0.iter().map(PlanarFrame::len).sum()
    }

    /// Flattens the batch into one contiguous buffer, frame after frame.
    #[must_use]
    pub fn into_flat(self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.value_count());
        for frame in self.0 {
            flat.extend(frame.0);
        }
        flat
    }

    /// Checks shape and value range against a model's frame count.
    pub fn validate(&self, expected_frames: usize) -> Result<(), PayloadError> {
        if self.0.is_empty() {
            return Err(PayloadError::Empty);
        }
        if self.0.len() != expected_frames {
            return Err(PayloadError::FrameCount {
                expected: expected_frames,
                actual: self.0.len(),
            });
        }
        for (index, frame) in self.0.iter().enumerate() {
            if frame.len() != FRAME_LEN {
                return Err(PayloadError::FrameLength {
                    index,
                    actual: frame.len(),
                });
            }
            if frame
                .values()
                .iter()
                .any(|v| !v.is_finite() || *v < -1.0 || *v > 1.0)
            {
                return Err(PayloadError::OutOfRange { index });
            }
        }
        Ok(())
    }
}
