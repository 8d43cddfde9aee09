// SPDX-License-Identifier: MPL-2.0
//! Message contracts between the coordinator and its collaborators.
//!
//! Each channel has one closed enum. Foreign JSON payloads are decoded once
//! at the boundary with `from_json`; everything past that point is typed.
//!
//! Wire shape: objects tagged by a `type` field in `SCREAMING_SNAKE_CASE`,
//! fields in camelCase.
//!
//! ```
//! use ad_lens::application::protocol::ControlMessage;
//!
//! let msg = ControlMessage::from_json(r#"{"type":"SET_ENABLED","enabled":false}"#).unwrap();
//! assert_eq!(msg, ControlMessage::SetEnabled { enabled: false });
//! ```

use crate::domain::detection::{Probability, RequestId};
use crate::domain::frame::FrameBatch;
use crate::error::DetectionError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to decode or encode a message at the boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Decode(String),

    #[error("cannot encode message: {0}")]
    Encode(String),
}

fn decode<T: DeserializeOwned>(json: &str) -> Result<T, ProtocolError> {
    serde_json::from_str(json).map_err(|e| ProtocolError::Decode(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(value).map_err(|e| ProtocolError::Encode(e.to_string()))
}

// =============================================================================
// Coordinator -> Inference engine
// =============================================================================

/// Commands accepted by the inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineCommand {
    /// Load the given model (or the default one) unless a model is loaded.
    #[serde(rename_all = "camelCase")]
    Init {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_id: Option<String>,
    },

    /// Switch to another model.
    #[serde(rename_all = "camelCase")]
    ChangeModel { model_id: String },

    /// Run inference on a frame batch.
    #[serde(rename_all = "camelCase")]
    ProcessFrames {
        request_id: RequestId,
        #[serde(default)]
        frames: FrameBatch,
    },
}

impl EngineCommand {
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        decode(json)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        encode(self)
    }
}

// =============================================================================
// Inference engine -> Coordinator
// =============================================================================

/// Events emitted by the inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineEvent {
    /// The engine process is up and accepts `INIT`.
    SandboxReady,
    ModelLoaded(ModelLoaded),
    InferenceResult(InferenceReply),
}

impl EngineEvent {
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        decode(json)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        encode(self)
    }
}

/// Outcome of a model load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelLoaded {
    pub success: bool,
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Wire form of one inference result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceReply {
    pub request_id: RequestId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_time_ms: Option<f64>,
}

/// Typed inference result, produced exactly once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    pub request_id: RequestId,
    pub model_id: Option<String>,
    pub inference_time_ms: Option<f64>,
    pub outcome: Result<Probability, DetectionError>,
}

impl InferenceResult {
    /// A failed result with no engine metadata.
    #[must_use]
    pub fn failure(request_id: RequestId, error: DetectionError) -> Self {
        Self {
            request_id,
            model_id: None,
            inference_time_ms: None,
            outcome: Err(error),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn probability(&self) -> Option<Probability> {
        self.outcome.as_ref().ok().copied()
    }

    /// Converts back to the wire form.
    #[must_use]
    pub fn to_reply(&self) -> InferenceReply {
        let (success, probability, error) = match &self.outcome {
            Ok(p) => (true, Some(p.value()), None),
            Err(e) => (false, None, Some(e.to_string())),
        };
        InferenceReply {
            request_id: self.request_id,
            success,
            probability,
            error,
            model_id: self.model_id.clone(),
            inference_time_ms: self.inference_time_ms,
        }
    }
}

impl From<InferenceReply> for InferenceResult {
    fn from(reply: InferenceReply) -> Self {
        let outcome = match (reply.success, reply.probability) {
            (true, Some(p)) => Ok(Probability::new(p)),
            (true, None) => Err(DetectionError::EngineFailure(
                "result carries no probability".to_string(),
            )),
            (false, _) => Err(classify_engine_error(reply.error)),
        };
        Self {
            request_id: reply.request_id,
            model_id: reply.model_id,
            inference_time_ms: reply.inference_time_ms,
            outcome,
        }
    }
}

/// Maps an engine error string back onto the failure taxonomy.
fn classify_engine_error(error: Option<String>) -> DetectionError {
    const PAYLOAD_PREFIX: &str = "Invalid frames data: ";
    match error {
        Some(msg) if msg == DetectionError::RequestTimeout.to_string() => {
            DetectionError::RequestTimeout
        }
        Some(msg) => match msg.strip_prefix(PAYLOAD_PREFIX) {
            Some(detail) => DetectionError::InvalidPayload(detail.to_string()),
            None => DetectionError::EngineFailure(msg),
        },
        None => DetectionError::EngineFailure("unknown engine error".to_string()),
    }
}

// =============================================================================
// Control surface -> Coordinator
// =============================================================================

/// Messages from the settings UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    UpdateDebug { debug: bool },
    SetEnabled { enabled: bool },
    #[serde(rename_all = "camelCase")]
    ChangeModel { model_id: String },
}

impl ControlMessage {
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        decode(json)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        encode(self)
    }
}

// =============================================================================
// Page -> Coordinator
// =============================================================================

/// Notifications about the page hosting the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// The document changed; the main video may have appeared or been replaced.
    DomChanged,
}
