// SPDX-License-Identifier: MPL-2.0
//! Application layer - Detection orchestration.
//!
//! - [`port`]: Trait definitions for the external collaborators
//! - [`protocol`]: Typed messages exchanged with the engine, the control
//!   surface and the page
//! - [`sampler`]: Frame capture and normalization
//! - [`broker`]: Request/response correlation with the inference engine
//! - [`lifecycle`]: Binding to one video and its sampling cadence
//! - [`coordinator`]: The session task tying everything together
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//!
//! # Example
//!
//! ```ignore
//! use ad_lens::application::coordinator::{Collaborators, Coordinator};
//!
//! let (coordinator, handle) = Coordinator::new(config, collaborators);
//! tokio::spawn(coordinator.run());
//! handle.send_control(ControlMessage::SetEnabled { enabled: false });
//! ```

pub mod broker;
pub mod coordinator;
pub mod lifecycle;
pub mod port;
pub mod protocol;
pub mod sampler;

pub use broker::{PendingInference, RequestBroker};
pub use coordinator::{Collaborators, Coordinator, CoordinatorHandle, EngineLink};
pub use lifecycle::VideoLifecycleController;
pub use sampler::FrameSampler;
