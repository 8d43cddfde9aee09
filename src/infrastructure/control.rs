// SPDX-License-Identifier: MPL-2.0
//! JSON-lines control surface.
//!
//! Plays the part of the settings UI: each line is one [`ControlMessage`].
//! The matching setting is persisted first, then the message is forwarded to
//! the coordinator, so a restart picks up the same state.

use crate::application::port::SettingsStore;
use crate::application::protocol::ControlMessage;
use crate::application::CoordinatorHandle;
use crate::error::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// What happened to one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// The message was persisted and delivered.
    Applied(ControlMessage),
    /// Blank or comment line.
    Skipped,
    /// The coordinator has stopped listening.
    Disconnected,
}

pub struct ControlSurface<S: SettingsStore> {
    store: S,
    handle: CoordinatorHandle,
}

impl<S: SettingsStore> ControlSurface<S> {
    pub fn new(store: S, handle: CoordinatorHandle) -> Self {
        Self { store, handle }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes the setting carried by `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn persist(&mut self, message: &ControlMessage) -> Result<()> {
        let mut settings = self.store.load();
        match message {
            ControlMessage::UpdateDebug { debug } => settings.debug = Some(*debug),
            ControlMessage::SetEnabled { enabled } => settings.enabled = Some(*enabled),
            ControlMessage::ChangeModel { model_id } => {
                settings.selected_model_id = Some(model_id.clone());
            }
        }
        self.store.save(&settings)
    }

    /// Persists and forwards one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the setting cannot be persisted; the message is
    /// not forwarded in that case.
    pub fn apply(&mut self, message: ControlMessage) -> Result<LineOutcome> {
        self.persist(&message)?;
        if self.handle.send_control(message.clone()) {
            Ok(LineOutcome::Applied(message))
        } else {
            Ok(LineOutcome::Disconnected)
        }
    }

    /// Decodes and applies one input line.
    ///
    /// # Errors
    ///
    /// Returns an error for undecodable lines or persistence failures.
    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(LineOutcome::Skipped);
        }
        let message = ControlMessage::from_json(line)?;
        self.apply(message)
    }

    /// Reads messages until end of input or until the coordinator is gone.
    /// Bad lines are logged and skipped.
    ///
    /// Returns the number of applied messages.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from `reader` fails.
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, reader: R) -> Result<usize> {
        let mut lines = reader.lines();
        let mut applied = 0;
        while let Some(line) = lines.next_line().await? {
            match self.handle_line(&line) {
                Ok(LineOutcome::Applied(message)) => {
                    log::debug!("Control message applied: {message:?}");
                    applied += 1;
                }
                Ok(LineOutcome::Skipped) => {}
                Ok(LineOutcome::Disconnected) => {
                    log::debug!("Coordinator gone, closing control input");
                    break;
                }
                Err(err) => log::warn!("Ignoring control line {line:?}: {err}"),
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::coordinator::{Collaborators, Coordinator, EngineLink};
    use crate::application::port::Settings;
    use crate::config::DetectorConfig;
    use crate::error::Error;
    use crate::infrastructure::frames::SingleVideoLocator;
    use crate::infrastructure::settings::MemorySettingsStore;
    use crate::test_utils::RecordingOverlay;
    use tokio::sync::mpsc;

    fn coordinator() -> (Coordinator, CoordinatorHandle) {
        let (commands, _engine_rx) = mpsc::unbounded_channel();
        let (_events_tx, events) = mpsc::unbounded_channel();
        Coordinator::new(
            DetectorConfig::default(),
            Collaborators {
                settings: Box::new(MemorySettingsStore::default()),
                locator: Box::new(SingleVideoLocator::empty()),
                overlay: Box::new(RecordingOverlay::new()),
                engine: EngineLink { commands, events },
            },
        )
    }

    #[test]
    fn each_message_persists_its_setting() {
        let (_coordinator, handle) = coordinator();
        let store = MemorySettingsStore::default();
        let mut surface = ControlSurface::new(store.clone(), handle);

        surface
            .handle_line(r#"{"type":"UPDATE_DEBUG","debug":false}"#)
            .expect("debug");
        surface
            .handle_line(r#"{"type":"SET_ENABLED","enabled":false}"#)
            .expect("enabled");
        surface
            .handle_line(r#"{"type":"CHANGE_MODEL","modelId":"resnet50"}"#)
            .expect("model");

        assert_eq!(
            store.load(),
            Settings {
                debug: Some(false),
                enabled: Some(false),
                selected_model_id: Some("resnet50".into()),
            }
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let (_coordinator, handle) = coordinator();
        let mut surface = ControlSurface::new(MemorySettingsStore::default(), handle);

        assert_eq!(surface.handle_line("   ").expect("blank"), LineOutcome::Skipped);
        assert_eq!(
            surface.handle_line("# pause detection").expect("comment"),
            LineOutcome::Skipped
        );
        assert_eq!(surface.store().load(), Settings::default());
    }

    #[test]
    fn undecodable_line_is_an_error() {
        let (_coordinator, handle) = coordinator();
        let mut surface = ControlSurface::new(MemorySettingsStore::default(), handle);

        let err = surface.handle_line(r#"{"type":"REBOOT"}"#).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn dropped_coordinator_reports_disconnect() {
        let (coordinator, handle) = coordinator();
        drop(coordinator);
        let mut surface = ControlSurface::new(MemorySettingsStore::default(), handle);

        let outcome = surface
            .apply(ControlMessage::SetEnabled { enabled: true })
            .expect("persisted");
        assert_eq!(outcome, LineOutcome::Disconnected);
        assert_eq!(surface.store().load().enabled, Some(true));
    }

    #[tokio::test]
    async fn run_counts_applied_messages_and_skips_bad_lines() {
        let (_coordinator, handle) = coordinator();
        let surface = ControlSurface::new(MemorySettingsStore::default(), handle);
        let input = concat!(
            "{\"type\":\"UPDATE_DEBUG\",\"debug\":true}\n",
            "not json\n",
            "\n",
            "{\"type\":\"SET_ENABLED\",\"enabled\":false}\n",
        );

        let applied = surface.run(input.as_bytes()).await.expect("run");
        assert_eq!(applied, 2);
    }
}
