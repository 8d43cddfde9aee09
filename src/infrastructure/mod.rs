// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`. These adapters wrap external dependencies like ONNX
//! Runtime, the `image` decoders and system I/O.
//!
//! # Available Adapters
//!
//! - [`engine`]: Inference worker and its ONNX backend (implements [`ModelBackend`])
//! - [`settings`]: CBOR settings persistence (implements [`SettingsStore`])
//! - [`overlay`]: Log-based ad marker (implements [`OverlayRenderer`])
//! - [`frames`]: Image-sequence video and locator (implements [`VideoSource`])
//! - [`control`]: JSON-lines control surface
//!
//! [`ModelBackend`]: crate::application::port::ModelBackend
//! [`SettingsStore`]: crate::application::port::SettingsStore
//! [`OverlayRenderer`]: crate::application::port::OverlayRenderer
//! [`VideoSource`]: crate::application::port::VideoSource

pub mod control;
pub mod engine;
pub mod frames;
pub mod overlay;
pub mod settings;

// Re-export main types for convenience
pub use control::ControlSurface;
pub use engine::{InferenceEngine, OnnxBackend};
pub use frames::{ImageSequenceVideo, SingleVideoLocator};
pub use overlay::LogOverlay;
pub use settings::{FileSettingsStore, MemorySettingsStore};
