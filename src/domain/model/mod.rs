// SPDX-License-Identifier: MPL-2.0
//! Model profiles and the static registry of shipped detectors.
//!
//! A [`ModelProfile`] tells the coordinator how many frames a model consumes
//! and which decision threshold it was calibrated for. The inference engine
//! uses the same profile to shape its input tensor and to turn raw model
//! output into a probability.

use serde::{Deserialize, Serialize};

/// Identifier of the model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "custom";

/// Threshold reported for models that do not declare one.
pub const FALLBACK_THRESHOLD: f64 = 0.5;

/// Input family of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Single-frame classifier, input `[1, 3, H, W]`, two-logit output.
    Standard,
    /// Multi-frame classifier, input `[1, N, 3, H, W]`, probability output.
    Temporal,
}

impl ModelKind {
    /// Converts the raw model output into an ad probability.
    ///
    /// Temporal models emit the probability directly as their first value.
    /// Standard models emit `[non_ad, ad]` logits; the ad logit goes through
    /// a sigmoid. Returns `None` when the output is too short.
    #[must_use]
    pub fn probability_from_output(self, output: &[f32]) -> Option<f64> {
        match self {
            ModelKind::Temporal => output.first().map(|p| f64::from(*p)),
            ModelKind::Standard => output.get(1).map(|logit| sigmoid(f64::from(*logit))),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Static description of one detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelProfile {
    /// Stable identifier used in settings and messages.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// ONNX file name, relative to the model directory.
    pub file: &'static str,
    pub kind: ModelKind,
    /// Number of frames per inference call.
    pub frame_count: usize,
    /// Calibrated decision threshold.
    pub default_threshold: f64,
    pub description: &'static str,
}

const SINGLE_FRAME_DESCRIPTION: &str = "Analyzes single frames for visual ad patterns";

/// Every detector shipped with the application. The first entry is the fallback.
pub const MODEL_REGISTRY: &[ModelProfile] = &[
    ModelProfile {
        id: "custom",
        name: "Custom Ad Detector",
        file: "custom_ad_detector.onnx",
        kind: ModelKind::Temporal,
        frame_count: 5,
        default_threshold: 0.5,
        description: "Analyzes 5 consecutive frames for temporal patterns in ads",
    },
    ModelProfile {
        id: "resnet18",
        name: "ResNet (18)",
        file: "resnet18_ad_detector.onnx",
        kind: ModelKind::Standard,
        frame_count: 1,
        default_threshold: 0.5,
        description: SINGLE_FRAME_DESCRIPTION,
    },
    ModelProfile {
        id: "resnet50",
        name: "ResNet (50)",
        file: "resnet50_ad_detector.onnx",
        kind: ModelKind::Standard,
        frame_count: 1,
        default_threshold: 0.5,
        description: SINGLE_FRAME_DESCRIPTION,
    },
    ModelProfile {
        id: "efficientnet-v2-s",
        name: "EfficientNetV2 (Small)",
        file: "efficientnet_v2_s_ad_detector.onnx",
        kind: ModelKind::Standard,
        frame_count: 1,
        default_threshold: 0.5,
        description: SINGLE_FRAME_DESCRIPTION,
    },
    ModelProfile {
        id: "efficientnet-v2-m",
        name: "EfficientNetV2 (Medium)",
        file: "efficientnet_v2_m_ad_detector.onnx",
        kind: ModelKind::Standard,
        frame_count: 1,
        default_threshold: 0.5,
        description: SINGLE_FRAME_DESCRIPTION,
    },
    ModelProfile {
        id: "efficientnet-v2-l",
        name: "EfficientNetV2 (Large)",
        file: "efficientnet_v2_l_ad_detector.onnx",
        kind: ModelKind::Standard,
        frame_count: 1,
        default_threshold: 0.5,
        description: SINGLE_FRAME_DESCRIPTION,
    },
    ModelProfile {
        id: "mobilenet-v3-small",
        name: "MobileNet V3 (Small)",
        file: "mobilenet_v3_small_ad_detector.onnx",
        kind: ModelKind::Standard,
        frame_count: 1,
        default_threshold: 0.5,
        description: SINGLE_FRAME_DESCRIPTION,
    },
];

impl ModelProfile {
    /// Looks up a profile by exact id.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static ModelProfile> {
        MODEL_REGISTRY.iter().find(|profile| profile.id == id)
    }

    /// Looks up a profile, falling back to the first registry entry for unknown ids.
    #[must_use]
    pub fn resolve(id: &str) -> &'static ModelProfile {
        Self::find(id).unwrap_or(&MODEL_REGISTRY[0])
    }

    /// The profile used when no model is configured.
    #[must_use]
    pub fn default_profile() -> &'static ModelProfile {
        Self::resolve(DEFAULT_MODEL_ID)
    }

    /// Tensor shape expected by this model for a single batch.
    #[must_use]
    pub fn input_shape(&self, frame_size: usize) -> Vec<usize> {
        match self.kind {
            ModelKind::Temporal => vec![1, self.frame_count, 3, frame_size, frame_size],
            ModelKind::Standard => vec![1, 3, frame_size, frame_size],
        }
    }
}
