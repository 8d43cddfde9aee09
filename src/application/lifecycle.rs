// SPDX-License-Identifier: MPL-2.0
//! Video lifecycle controller.
//!
//! Owns the binding to the one tracked video: its periodic ticker, its
//! playback-event listener and the sampling pass in flight. Dropping the
//! binding is the teardown: the ticker stops, the listener detaches and any
//! outstanding pass is abandoned.
//!
//! The controller also owns [`DetectionState`], which only changes while a
//! video is bound.

use crate::application::port::{OverlayRenderer, VideoEvent, VideoEventStream, VideoId, VideoSource};
use crate::application::protocol::InferenceResult;
use crate::domain::detection::Decision;
use crate::domain::lifecycle::{Effect, LifecycleEvent, LifecyclePhase};
use crate::error::DetectionError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Default period of the sampling ticker.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How a sampling pass ended.
#[derive(Debug)]
pub enum PassOutcome {
    /// No request was issued (the source had no frame).
    Skipped(DetectionError),
    /// The broker resolved the request.
    Resolved {
        result: InferenceResult,
        round_trip: Duration,
    },
}

/// A sampling pass: capture, submit, await the result.
pub type PassFuture = Pin<Box<dyn Future<Output = PassOutcome> + Send>>;

/// What woke the controller up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Tick,
    Video(VideoEvent),
}

#[derive(Debug)]
pub enum LifecycleSignal {
    Trigger(Trigger),
    PassCompleted(PassOutcome),
}

/// Detection state for the bound video.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectionState {
    pub overlay_visible: bool,
    pub last_decision: Decision,
}

/// Result of [`VideoLifecycleController::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The video was already bound; nothing changed.
    AlreadyBound,
    Bound,
    /// A previous video was torn down first.
    Replaced,
}

struct Binding {
    video: Arc<dyn VideoSource>,
    ticker: Interval,
    events: Option<VideoEventStream>,
    in_flight: Option<PassFuture>,
}

/// Tracks at most one video and decides when sampling runs.
pub struct VideoLifecycleController {
    phase: LifecyclePhase,
    binding: Option<Binding>,
    state: DetectionState,
    tick_interval: Duration,
}

impl std::fmt::Debug for VideoLifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoLifecycleController")
            .field("phase", &self.phase)
            .field("video", &self.bound_id())
            .field("processing", &self.is_processing())
            .field("state", &self.state)
            .finish()
    }
}

impl Default for VideoLifecycleController {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl VideoLifecycleController {
    #[must_use]
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            phase: LifecyclePhase::Idle,
            binding: None,
            state: DetectionState::default(),
            tick_interval,
        }
    }

    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> DetectionState {
        self.state
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Returns true while a sampling pass is outstanding.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|binding| binding.in_flight.is_some())
    }

    #[must_use]
    pub fn bound_id(&self) -> Option<VideoId> {
        self.binding.as_ref().map(|binding| binding.video.id())
    }

    #[must_use]
    pub fn video(&self) -> Option<Arc<dyn VideoSource>> {
        self.binding.as_ref().map(|binding| Arc::clone(&binding.video))
    }

    /// Starts tracking `video`.
    ///
    /// Binding the video that is already tracked is a no-op. Binding a
    /// different one tears the previous binding down first.
    pub fn bind(
        &mut self,
        video: Arc<dyn VideoSource>,
        overlay: &mut dyn OverlayRenderer,
    ) -> BindOutcome {
        let replaced = match self.bound_id() {
            Some(id) if id == video.id() => return BindOutcome::AlreadyBound,
            Some(_) => {
                self.teardown(overlay);
                true
            }
            None => false,
        };

        let mut ticker = tokio::time::interval_at(
            Instant::now() + self.tick_interval,
            self.tick_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let events = Some(video.subscribe());
        self.binding = Some(Binding {
            video,
            ticker,
            events,
            in_flight: None,
        });
        self.apply(LifecycleEvent::Bind);

        if replaced {
            BindOutcome::Replaced
        } else {
            BindOutcome::Bound
        }
    }

    /// Stops tracking the bound video. Returns false when nothing was bound.
    pub fn unbind(&mut self, overlay: &mut dyn OverlayRenderer) -> bool {
        if self.binding.is_none() {
            return false;
        }
        self.teardown(overlay);
        true
    }

    fn teardown(&mut self, overlay: &mut dyn OverlayRenderer) {
        // Drops the ticker, the listener and any pass in flight.
        self.binding = None;
        overlay.hide();
        self.state.overlay_visible = false;
        self.apply(LifecycleEvent::Unbind);
    }

    /// Feeds a trigger through the state machine and returns its effect.
    pub fn trigger(&mut self, trigger: Trigger) -> Effect {
        let Some(binding) = &self.binding else {
            return Effect::None;
        };
        let event = match trigger {
            Trigger::Tick => LifecycleEvent::Tick {
                playing: !binding.video.is_paused() && !binding.video.is_ended(),
            },
            Trigger::Video(VideoEvent::Play) => LifecycleEvent::Play,
            Trigger::Video(VideoEvent::Pause) => LifecycleEvent::Pause,
            Trigger::Video(VideoEvent::Seeked) => LifecycleEvent::Seeked,
            Trigger::Video(VideoEvent::Ended) => LifecycleEvent::Ended,
        };
        self.apply(event)
    }

    fn apply(&mut self, event: LifecycleEvent) -> Effect {
        match self.phase.transition(event) {
            Ok((next, effect)) => {
                self.phase = next;
                effect
            }
            Err(err) => {
                log::warn!("Ignoring lifecycle event: {err}");
                Effect::None
            }
        }
    }

    /// Marks `pass` as the outstanding pass.
    ///
    /// Returns false (and drops the pass) when nothing is bound or a pass is
    /// already in flight.
    pub fn begin_pass(&mut self, pass: PassFuture) -> bool {
        match self.binding.as_mut() {
            Some(binding) if binding.in_flight.is_none() => {
                binding.in_flight = Some(pass);
                true
            }
            _ => false,
        }
    }

    /// Records a decision and updates the overlay to match.
    pub fn apply_decision(
        &mut self,
        decision: Decision,
        model_id: Option<&str>,
        overlay: &mut dyn OverlayRenderer,
    ) {
        if self.binding.is_none() {
            return;
        }
        self.state.last_decision = decision;
        if decision.is_ad {
            overlay.show(&decision, model_id);
            self.state.overlay_visible = true;
        } else if self.state.overlay_visible {
            overlay.hide();
            self.state.overlay_visible = false;
        }
    }

    /// Waits for the next tick, playback event or pass completion.
    ///
    /// Never resolves while no video is bound. Cancel safe.
    pub async fn next_signal(&mut self) -> LifecycleSignal {
        let Some(binding) = self.binding.as_mut() else {
            return std::future::pending().await;
        };
        let Binding {
            ticker,
            events,
            in_flight,
            ..
        } = binding;

        loop {
            tokio::select! {
                _ = ticker.tick() => return LifecycleSignal::Trigger(Trigger::Tick),
                event = next_event(events) => match event {
                    Some(event) => return LifecycleSignal::Trigger(Trigger::Video(event)),
                    // The source dropped its listeners; keep ticking.
                    None => *events = None,
                },
                outcome = run_pass(in_flight) => {
                    *in_flight = None;
                    return LifecycleSignal::PassCompleted(outcome);
                }
            }
        }
    }
}

async fn next_event(events: &mut Option<VideoEventStream>) -> Option<VideoEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn run_pass(in_flight: &mut Option<PassFuture>) -> PassOutcome {
    match in_flight {
        Some(pass) => pass.await,
        None => std::future::pending().await,
    }
}
