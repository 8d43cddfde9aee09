// SPDX-License-Identifier: MPL-2.0
//! Detection coordinator.
//!
//! One async task owns the whole detection session: settings flags, engine
//! readiness, the active model, the decision engine and the lifecycle
//! controller. It reacts to four sources:
//!
//! - engine events (`SANDBOX_READY`, `MODEL_LOADED`, `INFERENCE_RESULT`)
//! - control messages from the settings surface
//! - page notifications (DOM changes)
//! - the bound video's ticks, playback events and the pass in flight
//!
//! All of them are multiplexed with `tokio::select!` in [`Coordinator::run`],
//! so handlers never run concurrently and need no locking.

use crate::application::broker::RequestBroker;
use crate::application::lifecycle::{
    BindOutcome, LifecycleSignal, PassFuture, PassOutcome, Trigger, VideoLifecycleController,
};
use crate::application::port::{
    OverlayRenderer, SettingsStore, VideoEvent, VideoLocator, VideoSource,
};
use crate::application::protocol::{
    ControlMessage, EngineCommand, EngineEvent, ModelLoaded, PageEvent,
};
use crate::application::sampler::FrameSampler;
use crate::config::DetectorConfig;
use crate::domain::detection::{DecisionEngine, Thresholds};
use crate::domain::lifecycle::Effect;
use crate::domain::model::ModelProfile;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::time::{Instant, Sleep};

/// Both directions of the channel pair to the inference engine.
#[derive(Debug)]
pub struct EngineLink {
    pub commands: mpsc::UnboundedSender<EngineCommand>,
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
}

/// External collaborators driven by the coordinator.
pub struct Collaborators {
    pub settings: Box<dyn SettingsStore>,
    pub locator: Box<dyn VideoLocator>,
    pub overlay: Box<dyn OverlayRenderer>,
    pub engine: EngineLink,
}

/// Sender side of the coordinator's inbound channels.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    control: mpsc::UnboundedSender<ControlMessage>,
    page: mpsc::UnboundedSender<PageEvent>,
    shutdown: Arc<Notify>,
}

impl CoordinatorHandle {
    /// Delivers a control message. Returns false once the coordinator is gone.
    pub fn send_control(&self, message: ControlMessage) -> bool {
        self.control.send(message).is_ok()
    }

    pub fn notify_page(&self, event: PageEvent) -> bool {
        self.page.send(event).is_ok()
    }

    /// Asks the run loop to tear down and return.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[derive(Debug)]
struct Session {
    enabled: bool,
    debug: bool,
    engine_ready: bool,
    model_loaded: bool,
    active_model_id: Option<String>,
    required_frames: usize,
}

pub struct Coordinator {
    config: DetectorConfig,
    session: Session,
    settings: Box<dyn SettingsStore>,
    locator: Box<dyn VideoLocator>,
    overlay: Box<dyn OverlayRenderer>,
    engine: mpsc::UnboundedSender<EngineCommand>,
    engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    control: mpsc::UnboundedReceiver<ControlMessage>,
    page: mpsc::UnboundedReceiver<PageEvent>,
    shutdown: Arc<Notify>,
    broker: RequestBroker,
    sampler: FrameSampler,
    controller: VideoLifecycleController,
    decision: DecisionEngine,
    locate_retry: Option<Pin<Box<Sleep>>>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("session", &self.session)
            .field("controller", &self.controller)
            .field("broker", &self.broker)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    #[must_use]
    pub fn new(config: DetectorConfig, parts: Collaborators) -> (Self, CoordinatorHandle) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (page_tx, page_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());

        let handle = CoordinatorHandle {
            control: control_tx,
            page: page_tx,
            shutdown: Arc::clone(&shutdown),
        };

        let coordinator = Self {
            session: Session {
                enabled: true,
                debug: true,
                engine_ready: false,
                model_loaded: false,
                active_model_id: None,
                required_frames: ModelProfile::default_profile().frame_count,
            },
            settings: parts.settings,
            locator: parts.locator,
            overlay: parts.overlay,
            broker: RequestBroker::new(parts.engine.commands.clone(), config.request_timeout()),
            engine: parts.engine.commands,
            engine_events: parts.engine.events,
            control: control_rx,
            page: page_rx,
            shutdown,
            sampler: FrameSampler::new(config.capture_delay()),
            controller: VideoLifecycleController::new(config.tick_interval()),
            decision: DecisionEngine::default(),
            locate_retry: None,
            config,
        };

        (coordinator, handle)
    }

    /// Runs the session until shutdown or until the engine channel closes.
    pub async fn run(mut self) {
        self.start();

        loop {
            tokio::select! {
                () = self.shutdown.notified() => {
                    self.debug_log(format_args!("Shutdown requested"));
                    break;
                }
                event = self.engine_events.recv() => match event {
                    Some(event) => self.handle_engine_event(event),
                    None => {
                        log::warn!("Inference engine channel closed");
                        break;
                    }
                },
                Some(message) = self.control.recv() => self.handle_control(message),
                Some(event) = self.page.recv() => self.handle_page_event(event),
                signal = self.controller.next_signal() => self.handle_signal(signal),
                () = retry_elapsed(&mut self.locate_retry) => {
                    self.locate_retry = None;
                    self.find_video();
                }
            }
        }

        self.stop_detection();
        self.broker.clear("coordinator stopped");
    }

    fn debug_level(&self) -> log::Level {
        if self.session.debug {
            log::Level::Info
        } else {
            log::Level::Trace
        }
    }

    fn debug_log(&self, args: std::fmt::Arguments<'_>) {
        log::log!(self.debug_level(), "{args}");
    }

    /// Applies stored settings and looks for the main video.
    fn start(&mut self) {
        let settings = self.settings.load();
        self.session.debug = settings.debug_or_default();
        self.session.enabled = settings.enabled_or_default();
        self.debug_log(format_args!(
            "Initializing detector (debug: {}, enabled: {})",
            self.session.debug, self.session.enabled
        ));

        if !self.find_video() {
            self.locate_retry = Some(Box::pin(tokio::time::sleep(self.config.locate_retry())));
        }
    }

    /// Binds the main video if detection is enabled and one is present.
    fn find_video(&mut self) -> bool {
        if !self.session.enabled {
            self.debug_log(format_args!("Detection disabled, not looking for video"));
            return false;
        }
        let Some(video) = self.locator.find_main_video() else {
            return false;
        };
        self.bind(video);
        true
    }

    fn bind(&mut self, video: Arc<dyn VideoSource>) {
        let id = video.id().value();
        match self.controller.bind(video, self.overlay.as_mut()) {
            BindOutcome::AlreadyBound => {}
            BindOutcome::Bound => {
                self.debug_log(format_args!("Starting detection on video {id}"));
            }
            BindOutcome::Replaced => {
                let abandoned = self.broker.clear("video replaced");
                self.debug_log(format_args!(
                    "Switched detection to video {id} ({abandoned} request(s) abandoned)"
                ));
            }
        }
    }

    fn stop_detection(&mut self) {
        if self.controller.unbind(self.overlay.as_mut()) {
            self.debug_log(format_args!("Stopping detection"));
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::SandboxReady => {
                self.debug_log(format_args!("Inference engine is ready"));
                self.session.engine_ready = true;
                let model_id = self.settings.load().selected_model_id;
                self.send_engine(EngineCommand::Init { model_id });
            }
            EngineEvent::ModelLoaded(loaded) => self.on_model_loaded(loaded),
            EngineEvent::InferenceResult(reply) => {
                if !self.session.enabled {
                    return;
                }
                self.broker.resolve(reply.into());
            }
        }
    }

    fn on_model_loaded(&mut self, loaded: ModelLoaded) {
        self.debug_log(format_args!(
            "Model loaded: {} (model {})",
            loaded.success, loaded.model_id
        ));
        self.session.model_loaded = loaded.success;

        if !loaded.success {
            log::error!(
                "Failed to load model {}: {}",
                loaded.model_id,
                loaded.error.as_deref().unwrap_or("unknown error")
            );
            return;
        }

        let switched = self
            .session
            .active_model_id
            .as_deref()
            .is_some_and(|previous| previous != loaded.model_id);
        if switched && self.config.reset_history_on_model_change() {
            self.decision.reset_history();
        }
        self.session.active_model_id = Some(loaded.model_id);

        if let Some(frames) = loaded.frame_count {
            self.session.required_frames = frames.max(1);
            self.debug_log(format_args!("Required frames set to {frames}"));
        }
        if let Some(threshold) = loaded.default_threshold {
            let thresholds = Thresholds::from_default(threshold);
            self.decision.set_thresholds(thresholds);
            self.debug_log(format_args!(
                "Thresholds updated: main={:.2}, high={:.2}, low={:.2}",
                thresholds.default_threshold(),
                thresholds.high(),
                thresholds.low()
            ));
        }
    }

    fn handle_control(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::UpdateDebug { debug } => {
                self.session.debug = debug;
                self.debug_log(format_args!("Debug mode updated: {debug}"));
            }
            ControlMessage::SetEnabled { enabled } => {
                self.session.enabled = enabled;
                self.debug_log(format_args!("Enabled state updated: {enabled}"));
                if enabled {
                    self.find_video();
                } else {
                    self.stop_detection();
                    self.broker.clear("detection disabled");
                }
            }
            ControlMessage::ChangeModel { model_id } => {
                if model_id.is_empty()
                    || self.session.active_model_id.as_deref() == Some(model_id.as_str())
                {
                    return;
                }
                if self.session.engine_ready {
                    self.debug_log(format_args!("Changing model to: {model_id}"));
                    self.send_engine(EngineCommand::ChangeModel { model_id });
                } else {
                    self.debug_log(format_args!("Cannot change model: engine not ready"));
                }
            }
        }
    }

    fn handle_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::DomChanged => {
                let detached = self
                    .controller
                    .video()
                    .is_none_or(|video| !video.is_attached());
                if self.session.enabled && detached {
                    self.find_video();
                }
            }
        }
    }

    fn handle_signal(&mut self, signal: LifecycleSignal) {
        match signal {
            LifecycleSignal::Trigger(trigger) => {
                match trigger {
                    Trigger::Tick => {}
                    Trigger::Video(VideoEvent::Play) => self.debug_log(format_args!("Video playing")),
                    Trigger::Video(VideoEvent::Pause) => self.debug_log(format_args!("Video paused")),
                    Trigger::Video(VideoEvent::Seeked) => self.debug_log(format_args!("Video seeked")),
                    Trigger::Video(VideoEvent::Ended) => self.debug_log(format_args!("Video ended")),
                }
                if self.controller.trigger(trigger) == Effect::Sample {
                    self.process_current_video();
                }
            }
            LifecycleSignal::PassCompleted(outcome) => self.finish_pass(outcome),
        }
    }

    /// Starts a sampling pass unless one is outstanding or detection cannot run.
    fn process_current_video(&mut self) {
        if !self.session.enabled || !self.session.model_loaded || self.controller.is_processing() {
            return;
        }
        let Some(video) = self.controller.video() else {
            return;
        };

        let sampler = self.sampler;
        let broker = self.broker.clone();
        let count = self.session.required_frames;
        self.debug_log(format_args!("Extracting {count} frame(s)"));

        let pass: PassFuture = Box::pin(async move {
            let frames = match sampler.sample(&*video, count).await {
                Ok(frames) => frames,
                Err(err) => return PassOutcome::Skipped(err),
            };
            let started = Instant::now();
            let result = broker.submit(frames).wait().await;
            PassOutcome::Resolved {
                result,
                round_trip: started.elapsed(),
            }
        });
        self.controller.begin_pass(pass);
    }

    fn finish_pass(&mut self, outcome: PassOutcome) {
        let (result, round_trip) = match outcome {
            PassOutcome::Skipped(err) => {
                self.debug_log(format_args!("Failed to extract frames: {err}"));
                return;
            }
            PassOutcome::Resolved { result, round_trip } => (result, round_trip),
        };

        let probability = match result.outcome {
            Ok(probability) => probability,
            Err(err) => {
                self.debug_log(format_args!("Inference failed: {err}"));
                return;
            }
        };

        self.debug_log(format_args!(
            "Ad probability: {} | Inference: {} | Total: {:.2}ms (Model: {})",
            probability.percent(),
            result
                .inference_time_ms
                .map_or_else(|| "N/A".to_string(), |ms| format!("{ms:.2}ms")),
            round_trip.as_secs_f64() * 1000.0,
            result.model_id.as_deref().unwrap_or("unknown"),
        ));

        let decision = self
            .decision
            .observe(probability, self.controller.state().overlay_visible);
        self.debug_log(format_args!(
            "Smoothed prediction: isAd={}, confidence={:.2}",
            decision.is_ad, decision.confidence
        ));
        self.controller.apply_decision(
            decision,
            self.session.active_model_id.as_deref(),
            self.overlay.as_mut(),
        );
    }

    fn send_engine(&self, command: EngineCommand) {
        if self.engine.send(command).is_err() {
            log::warn!("Inference engine is not running");
        }
    }
}

async fn retry_elapsed(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
