// SPDX-License-Identifier: MPL-2.0
//! Model backend port definition.
//!
//! The inference worker owns protocol handling and payload validation; a
//! [`ModelBackend`] only loads a model and runs one forward pass. This keeps
//! hardware execution details out of the worker and lets tests script model
//! output.

use crate::domain::frame::FrameBatch;
use crate::domain::model::ModelProfile;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a model backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Model produced no output")]
    NoOutput,
}

/// Port for the execution backend behind the inference worker.
pub trait ModelBackend: Send {
    /// Loads the model for `profile`, replacing any previously loaded one.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file is missing or cannot be initialized.
    fn load(&mut self, profile: &ModelProfile) -> Result<(), BackendError>;

    /// Releases the loaded model, if any.
    fn unload(&mut self);

    /// Runs one forward pass and returns the flattened first output tensor.
    ///
    /// The batch has already been validated against `profile`.
    ///
    /// # Errors
    ///
    /// Returns an error if no model is loaded or execution fails.
    fn run(&mut self, profile: &ModelProfile, batch: FrameBatch) -> Result<Vec<f32>, BackendError>;
}
