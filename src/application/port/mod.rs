// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for the external collaborators.
//!
//! Infrastructure adapters implement these; the coordinator only sees the
//! traits.
//!
//! # Available Ports
//!
//! - [`video`]: The live video element and its discovery
//! - [`overlay`]: The visual ad marker
//! - [`settings`]: Durable user settings
//! - [`backend`]: Model execution behind the inference worker

pub mod backend;
pub mod overlay;
pub mod settings;
pub mod video;

pub use backend::{BackendError, ModelBackend};
pub use overlay::OverlayRenderer;
pub use settings::{Settings, SettingsStore};
pub use video::{VideoEvent, VideoEventStream, VideoId, VideoListeners, VideoLocator, VideoSource};
