// SPDX-License-Identifier: MPL-2.0
//! Isolated inference worker.
//!
//! The worker runs on a blocking Tokio thread and talks to the coordinator
//! only through [`EngineCommand`]/[`EngineEvent`] channels. It owns the
//! active [`ModelProfile`] and a [`ModelBackend`] that executes the model.
//!
//! Behaviour per command:
//! - `INIT`: loads the requested (or default) model; when a model is already
//!   loaded it re-announces it instead of reloading
//! - `CHANGE_MODEL`: reloads only for an id different from the active one
//! - `PROCESS_FRAMES`: validates the batch, runs the model and replies with
//!   exactly one `INFERENCE_RESULT`

pub mod onnx;

use crate::application::coordinator::EngineLink;
use crate::application::port::ModelBackend;
use crate::application::protocol::{EngineCommand, EngineEvent, InferenceResult, ModelLoaded};
use crate::domain::detection::{Probability, RequestId};
use crate::domain::frame::FrameBatch;
use crate::domain::model::{ModelProfile, DEFAULT_MODEL_ID};
use crate::error::DetectionError;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use onnx::OnnxBackend;

/// Reply text when a batch arrives before any model is loaded.
pub const MODEL_NOT_LOADED: &str = "Model not loaded yet";

/// Command handling state of the worker, independent of the thread it runs on.
pub struct InferenceEngine<B> {
    backend: B,
    profile: &'static ModelProfile,
    loaded: bool,
}

impl<B: ModelBackend> InferenceEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            profile: ModelProfile::default_profile(),
            loaded: false,
        }
    }

    #[must_use]
    pub fn profile(&self) -> &'static ModelProfile {
        self.profile
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Handles one command and returns the event to send back, if any.
    pub fn handle(&mut self, command: EngineCommand) -> Option<EngineEvent> {
        match command {
            EngineCommand::Init { model_id } => {
                if self.loaded {
                    return Some(EngineEvent::ModelLoaded(self.announce()));
                }
                let model_id = model_id.filter(|id| !id.is_empty());
                Some(EngineEvent::ModelLoaded(
                    self.load(model_id.as_deref().unwrap_or(DEFAULT_MODEL_ID)),
                ))
            }
            EngineCommand::ChangeModel { model_id } => {
                if model_id.is_empty() || model_id == self.profile.id {
                    return None;
                }
                Some(EngineEvent::ModelLoaded(self.load(&model_id)))
            }
            EngineCommand::ProcessFrames { request_id, frames } => Some(
                EngineEvent::InferenceResult(self.process(request_id, frames).to_reply()),
            ),
        }
    }

    fn announce(&self) -> ModelLoaded {
        ModelLoaded {
            success: true,
            model_id: self.profile.id.to_string(),
            frame_count: Some(self.profile.frame_count),
            default_threshold: Some(self.profile.default_threshold),
            error: None,
        }
    }

    fn load(&mut self, model_id: &str) -> ModelLoaded {
        self.backend.unload();
        self.loaded = false;

        let profile = ModelProfile::find(model_id).unwrap_or_else(|| {
            let fallback = ModelProfile::resolve(model_id);
            log::warn!("Unknown model {model_id}, using {}", fallback.id);
            fallback
        });
        self.profile = profile;
        log::info!("Loading {} model...", profile.name);

        match self.backend.load(profile) {
            Ok(()) => {
                self.loaded = true;
                log::info!("{} model ready for inference", profile.name);
                self.announce()
            }
            Err(err) => {
                log::error!("Error loading model {}: {err}", profile.id);
                ModelLoaded {
                    success: false,
                    model_id: profile.id.to_string(),
                    frame_count: None,
                    default_threshold: Some(profile.default_threshold),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn process(&mut self, request_id: RequestId, frames: FrameBatch) -> InferenceResult {
        let mut result = InferenceResult::failure(
            request_id,
            DetectionError::EngineFailure(MODEL_NOT_LOADED.to_string()),
        );
        result.model_id = Some(self.profile.id.to_string());

        if let Err(err) = frames.validate(self.profile.frame_count) {
            log::warn!("Rejecting request {request_id}: {err}");
            result.outcome = Err(DetectionError::InvalidPayload(err.to_string()));
            return result;
        }
        if !self.loaded {
            return result;
        }

        let started = Instant::now();
        let output = self.backend.run(self.profile, frames);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        result.outcome = match output {
            Ok(values) => self
                .profile
                .kind
                .probability_from_output(&values)
                .map(Probability::new)
                .ok_or_else(|| {
                    DetectionError::EngineFailure("Model produced no output".to_string())
                }),
            Err(err) => {
                log::error!("Error during inference: {err}");
                Err(DetectionError::EngineFailure(err.to_string()))
            }
        };
        if result.outcome.is_ok() {
            log::debug!("Inference completed in {elapsed_ms:.2}ms");
            result.inference_time_ms = Some(elapsed_ms);
        }
        result
    }

    /// Releases the backend.
    pub fn shutdown(&mut self) {
        self.backend.unload();
        self.loaded = false;
    }
}

/// Spawns the worker on a blocking thread and returns the coordinator's end
/// of its channels.
///
/// The worker announces `SANDBOX_READY` first and exits once every command
/// sender is dropped.
pub fn spawn<B: ModelBackend + 'static>(backend: B) -> (EngineLink, JoinHandle<()>) {
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<EngineCommand>();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let handle = tokio::task::spawn_blocking(move || {
        let mut engine = InferenceEngine::new(backend);
        if event_tx.send(EngineEvent::SandboxReady).is_err() {
            return;
        }
        while let Some(command) = command_rx.blocking_recv() {
            let Some(event) = engine.handle(command) else {
                continue;
            };
            if event_tx.send(event).is_err() {
                break;
            }
        }
        engine.shutdown();
        log::debug!("Inference worker stopped");
    });

    (
        EngineLink {
            commands: command_tx,
            events: event_rx,
        },
        handle,
    )
}
