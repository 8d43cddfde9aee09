// SPDX-License-Identifier: MPL-2.0
//! Fake collaborators shared by the integration tests.

#![allow(dead_code)]

use ad_lens::application::port::{
    OverlayRenderer, VideoEvent, VideoEventStream, VideoId, VideoListeners, VideoSource,
};
use ad_lens::application::protocol::{EngineCommand, EngineEvent, InferenceReply, ModelLoaded};
use ad_lens::application::EngineLink;
use ad_lens::domain::detection::Decision;
use ad_lens::domain::frame::RgbaFrame;
use ad_lens::domain::model::DEFAULT_MODEL_ID;
use ad_lens::error::DetectionError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// =============================================================================
// Video
// =============================================================================

pub struct FakeVideo {
    id: VideoId,
    frame: RgbaFrame,
    paused: AtomicBool,
    attached: AtomicBool,
    captures: AtomicUsize,
    listeners: VideoListeners,
}

impl FakeVideo {
    /// A playing video with data, showing a small solid frame.
    pub fn playing() -> Arc<Self> {
        Arc::new(Self {
            id: VideoId::next(),
            frame: RgbaFrame::solid(16, 9, [10, 200, 30, 255]),
            paused: AtomicBool::new(false),
            attached: AtomicBool::new(true),
            captures: AtomicUsize::new(0),
            listeners: VideoListeners::new(),
        })
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.listeners.emit(VideoEvent::Pause);
    }

    pub fn play(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.listeners.emit(VideoEvent::Play);
    }

    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.active()
    }
}

impl VideoSource for FakeVideo {
    fn id(&self) -> VideoId {
        self.id
    }

    fn has_current_data(&self) -> bool {
        true
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn is_ended(&self) -> bool {
        false
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn capture(&self) -> Result<RgbaFrame, DetectionError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }

    fn subscribe(&self) -> VideoEventStream {
        self.listeners.subscribe()
    }
}

// =============================================================================
// Overlay
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCall {
    Show { confidence: f64 },
    Hide,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingOverlay {
    calls: Arc<Mutex<Vec<OverlayCall>>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<OverlayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn shows(&self) -> Vec<f64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                OverlayCall::Show { confidence } => Some(confidence),
                OverlayCall::Hide => None,
            })
            .collect()
    }

    pub fn is_showing(&self) -> bool {
        matches!(self.calls().last(), Some(OverlayCall::Show { .. }))
    }
}

impl OverlayRenderer for RecordingOverlay {
    fn show(&mut self, decision: &Decision, _model_id: Option<&str>) {
        self.calls.lock().unwrap().push(OverlayCall::Show {
            confidence: decision.confidence,
        });
    }

    fn hide(&mut self) {
        self.calls.lock().unwrap().push(OverlayCall::Hide);
    }
}

// =============================================================================
// Engine
// =============================================================================

/// How the scripted engine answers one `PROCESS_FRAMES`.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Probability(f64),
    Failure(String),
    /// Never answer.
    Silent,
}

/// Command as seen by the scripted engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Init(Option<String>),
    ChangeModel(String),
    Process { request_id: u64, frames: usize },
}

/// Observer side of a scripted engine.
#[derive(Debug, Clone)]
pub struct EngineProbe {
    seen: Arc<Mutex<Vec<Seen>>>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineProbe {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Request ids of every frame batch received so far.
    pub fn processed(&self) -> Vec<u64> {
        self.seen()
            .into_iter()
            .filter_map(|seen| match seen {
                Seen::Process { request_id, .. } => Some(request_id),
                _ => None,
            })
            .collect()
    }

    /// Pushes an unsolicited event to the coordinator.
    pub fn inject(&self, event: EngineEvent) {
        self.events.send(event).unwrap();
    }
}

/// Spawns an async engine that answers from `script` in order. Once the
/// script runs out every request is left unanswered.
pub fn scripted_engine(frame_count: usize, script: Vec<Reply>) -> (EngineLink, EngineProbe) {
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let probe = EngineProbe {
        seen: Arc::default(),
        events: event_tx.clone(),
    };

    let seen = Arc::clone(&probe.seen);
    tokio::spawn(async move {
        let mut script = VecDeque::from(script);
        let loaded = |model_id: String| {
            EngineEvent::ModelLoaded(ModelLoaded {
                success: true,
                model_id,
                frame_count: Some(frame_count),
                default_threshold: Some(0.5),
                error: None,
            })
        };

        let _ = event_tx.send(EngineEvent::SandboxReady);
        while let Some(command) = command_rx.recv().await {
            let event = match command {
                EngineCommand::Init { model_id } => {
                    seen.lock().unwrap().push(Seen::Init(model_id.clone()));
                    loaded(model_id.unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()))
                }
                EngineCommand::ChangeModel { model_id } => {
                    seen.lock().unwrap().push(Seen::ChangeModel(model_id.clone()));
                    loaded(model_id)
                }
                EngineCommand::ProcessFrames { request_id, frames } => {
                    seen.lock().unwrap().push(Seen::Process {
                        request_id: request_id.value(),
                        frames: frames.len(),
                    });
                    let (success, probability, error) = match script.pop_front() {
                        Some(Reply::Probability(p)) => (true, Some(p), None),
                        Some(Reply::Failure(msg)) => (false, None, Some(msg)),
                        Some(Reply::Silent) | None => continue,
                    };
                    EngineEvent::InferenceResult(InferenceReply {
                        request_id,
                        success,
                        probability,
                        error,
                        model_id: Some(DEFAULT_MODEL_ID.to_string()),
                        inference_time_ms: Some(12.5),
                    })
                }
            };
            if event_tx.send(event).is_err() {
                break;
            }
        }
    });

    (
        EngineLink {
            commands: command_tx,
            events: event_rx,
        },
        probe,
    )
}
