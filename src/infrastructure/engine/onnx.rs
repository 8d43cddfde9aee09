// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime backend for the inference worker.
//!
//! One `ort` session per loaded profile. Model files are resolved as
//! `<model_dir>/<profile.file>`. Standard models get a `[1, 3, 224, 224]`
//! input, temporal models `[1, N, 3, 224, 224]`.

use crate::application::port::{BackendError, ModelBackend};
use crate::domain::frame::{FrameBatch, FRAME_SIZE};
use crate::domain::model::ModelProfile;
use ndarray::{ArrayD, IxDyn};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};

/// Name of the model directory inside the application data directory.
pub const MODEL_DIR_NAME: &str = "models";

pub struct OnnxBackend {
    model_dir: PathBuf,
    session: Option<Session>,
}

impl OnnxBackend {
    #[must_use]
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            session: None,
        }
    }

    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Path of the ONNX file for `profile`.
    #[must_use]
    pub fn model_path(&self, profile: &ModelProfile) -> PathBuf {
        self.model_dir.join(profile.file)
    }

    #[must_use]
    pub fn is_session_ready(&self) -> bool {
        self.session.is_some()
    }
}

/// Lays a validated batch out as the model's input tensor.
pub fn input_tensor(profile: &ModelProfile, batch: FrameBatch) -> Result<ArrayD<f32>, BackendError> {
    let shape = profile.input_shape(FRAME_SIZE as usize);
    ArrayD::from_shape_vec(IxDyn(&shape), batch.into_flat())
        .map_err(|e| BackendError::InferenceFailed(format!("input shape {shape:?}: {e}")))
}

impl ModelBackend for OnnxBackend {
    fn load(&mut self, profile: &ModelProfile) -> Result<(), BackendError> {
        self.session = None;

        let path = self.model_path(profile);
        if !path.exists() {
            return Err(BackendError::ModelNotFound(path));
        }

        let session = Session::builder()
            .map_err(|e| BackendError::LoadFailed(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| BackendError::LoadFailed(e.to_string()))?
            .commit_from_file(&path)
            .map_err(|e| BackendError::LoadFailed(e.to_string()))?;

        log::debug!(
            "Loaded {} (inputs: {:?})",
            path.display(),
            session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>()
        );
        self.session = Some(session);
        Ok(())
    }

    fn unload(&mut self) {
        self.session = None;
    }

    fn run(&mut self, profile: &ModelProfile, batch: FrameBatch) -> Result<Vec<f32>, BackendError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BackendError::InferenceFailed("ONNX session not initialized".into()))?;

        let input = input_tensor(profile, batch)?;
        let input_name = session
            .inputs
            .first()
            .map_or_else(|| "input".to_string(), |i| i.name.clone());

        let input_ref = ort::value::TensorRef::from_array_view(&input)
            .map_err(|e| BackendError::InferenceFailed(e.to_string()))?;
        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_ref])
            .map_err(|e| BackendError::InferenceFailed(e.to_string()))?;

        let (_, output) = outputs.iter().next().ok_or(BackendError::NoOutput)?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| BackendError::InferenceFailed(e.to_string()))?;
        Ok(data.to_vec())
    }
}
