// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core detection logic with no I/O.
//!
//! # Modules
//!
//! - [`frame`]: Frame buffers and normalization ([`FrameBatch`](frame::FrameBatch))
//! - [`model`]: Model profiles and the shipped registry ([`ModelProfile`](model::ModelProfile))
//! - [`detection`]: Smoothing and hysteresis ([`DecisionEngine`](detection::DecisionEngine))
//! - [`lifecycle`]: Video lifecycle phases ([`LifecyclePhase`](lifecycle::LifecyclePhase))

pub mod detection;
pub mod frame;
pub mod lifecycle;
pub mod model;
