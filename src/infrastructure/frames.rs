// SPDX-License-Identifier: MPL-2.0
//! Video sources backed by still images.
//!
//! [`ImageSequenceVideo`] plays a directory of images at a fixed frame rate:
//! the playback clock decides which file is the current presentation frame,
//! and files are decoded lazily on capture. [`SingleVideoLocator`] hands one
//! such source to the coordinator.

use crate::application::port::{
    VideoEvent, VideoEventStream, VideoId, VideoListeners, VideoLocator, VideoSource,
};
use crate::domain::frame::RgbaFrame;
use crate::error::{DetectionError, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Image extensions accepted as frames.
const FRAME_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

/// Checks if a file has a supported frame extension.
fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Lists the frame files of `dir`, sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn scan_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_frame_file(&path) {
            frames.push(path);
        }
    }
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

#[derive(Debug)]
struct Playback {
    /// Position accumulated before the current play stretch.
    offset: Duration,
    /// Start of the current play stretch, `None` while paused.
    playing_since: Option<Instant>,
    /// Last decoded frame, keyed by its index.
    cached: Option<(usize, RgbaFrame)>,
}

impl Playback {
    fn position(&self) -> Duration {
        self.offset + self.playing_since.map_or(Duration::ZERO, |since| since.elapsed())
    }
}

/// A directory of images played back as a video.
#[derive(Debug)]
pub struct ImageSequenceVideo {
    id: VideoId,
    frames: Vec<PathBuf>,
    frame_duration: Duration,
    playback: Mutex<Playback>,
    listeners: VideoListeners,
}

impl ImageSequenceVideo {
    /// Opens `dir` as a paused video at `fps` frames per second.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frames`] if the directory holds no images, or an I/O
    /// error if it cannot be read.
    pub fn open(dir: &Path, fps: f64) -> Result<Arc<Self>> {
        let frames = scan_frames(dir)?;
        if frames.is_empty() {
            return Err(Error::Frames(format!("no images in {}", dir.display())));
        }
        Ok(Self::from_frames(frames, fps))
    }

    /// Builds a paused video over already-listed frame files.
    #[must_use]
    pub fn from_frames(frames: Vec<PathBuf>, fps: f64) -> Arc<Self> {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 1.0 };
        Arc::new(Self {
            id: VideoId::next(),
            frames,
            frame_duration: Duration::from_secs_f64(1.0 / fps),
            playback: Mutex::new(Playback {
                offset: Duration::ZERO,
                playing_since: None,
                cached: None,
            }),
            listeners: VideoListeners::new(),
        })
    }

    fn playback(&self) -> std::sync::MutexGuard<'_, Playback> {
        self.playback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total playback length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.frame_duration * u32::try_from(self.frames.len()).unwrap_or(u32::MAX)
    }

    /// Current playback position, capped at the duration.
    #[must_use]
    pub fn position(&self) -> Duration {
        self.playback().position().min(self.duration())
    }

    /// Index of the frame shown at the current position.
    #[must_use]
    pub fn current_index(&self) -> usize {
        let index = self.position().as_nanos() / self.frame_duration.as_nanos().max(1);
        usize::try_from(index)
            .unwrap_or(usize::MAX)
            .min(self.frames.len().saturating_sub(1))
    }

    pub fn play(&self) {
        {
            let mut playback = self.playback();
            if playback.playing_since.is_some() {
                return;
            }
            if playback.position() >= self.duration() {
                playback.offset = Duration::ZERO;
            }
            playback.playing_since = Some(Instant::now());
        }
        self.listeners.emit(VideoEvent::Play);
    }

    pub fn pause(&self) {
        {
            let mut playback = self.playback();
            let Some(since) = playback.playing_since.take() else {
                return;
            };
            playback.offset = (playback.offset + since.elapsed()).min(self.duration());
        }
        self.listeners.emit(VideoEvent::Pause);
    }

    /// Jumps to `position` without changing the paused state.
    pub fn seek(&self, position: Duration) {
        {
            let mut playback = self.playback();
            playback.offset = position.min(self.duration());
            if playback.playing_since.is_some() {
                playback.playing_since = Some(Instant::now());
            }
        }
        self.listeners.emit(VideoEvent::Seeked);
    }

    /// Plays from the current position and resolves once the last frame has
    /// been shown, after emitting [`VideoEvent::Ended`].
    pub async fn play_to_end(&self) {
        self.play();
        loop {
            let remaining = self.duration().saturating_sub(self.position());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(remaining).await;
        }
        {
            let mut playback = self.playback();
            playback.playing_since = None;
            playback.offset = self.duration();
        }
        log::debug!("Image sequence finished after {} frames", self.frames.len());
        self.listeners.emit(VideoEvent::Ended);
    }

    fn decode(path: &Path) -> std::result::Result<RgbaFrame, DetectionError> {
        let img = image_rs::open(path).map_err(|e| {
            log::debug!("Cannot decode frame {}: {e}", path.display());
            DetectionError::NotReady
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        RgbaFrame::new(width, height, rgba.into_raw()).ok_or(DetectionError::NotReady)
    }
}

impl VideoSource for ImageSequenceVideo {
    fn id(&self) -> VideoId {
        self.id
    }

    fn has_current_data(&self) -> bool {
        !self.frames.is_empty()
    }

    fn is_paused(&self) -> bool {
        self.playback().playing_since.is_none()
    }

    fn is_ended(&self) -> bool {
        self.playback().position() >= self.duration()
    }

    fn capture(&self) -> std::result::Result<RgbaFrame, DetectionError> {
        let index = self.current_index();
        if let Some((cached, frame)) = &self.playback().cached {
            if *cached == index {
                return Ok(frame.clone());
            }
        }

        let path = self.frames.get(index).ok_or(DetectionError::NotReady)?;
        let frame = Self::decode(path)?;
        self.playback().cached = Some((index, frame.clone()));
        Ok(frame)
    }

    fn subscribe(&self) -> VideoEventStream {
        self.listeners.subscribe()
    }
}

/// Locator over at most one video. Clones share the slot.
#[derive(Clone, Default)]
pub struct SingleVideoLocator {
    slot: Arc<Mutex<Option<Arc<dyn VideoSource>>>>,
}

impl SingleVideoLocator {
    #[must_use]
    pub fn new(video: Arc<dyn VideoSource>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(video))),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces the located video.
    pub fn set(&self, video: Arc<dyn VideoSource>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(video);
    }

    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl std::fmt::Debug for SingleVideoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|video| video.id());
        f.debug_struct("SingleVideoLocator").field("video", &id).finish()
    }
}

impl VideoLocator for SingleVideoLocator {
    fn find_main_video(&self) -> Option<Arc<dyn VideoSource>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|video| video.is_attached() && video.has_current_data())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeVideo;
    use image_rs::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_frames(dir: &Path, colours: &[[u8; 4]]) {
        for (i, colour) in colours.iter().enumerate() {
            RgbaImage::from_pixel(8, 6, Rgba(*colour))
                .save(dir.join(format!("frame_{i:03}.png")))
                .expect("write frame");
        }
    }

    #[test]
    fn open_rejects_directory_without_images() {
        let dir = tempdir().expect("failed to create temp dir");
        fs::write(dir.path().join("notes.txt"), b"hello").expect("write");

        let result = ImageSequenceVideo::open(dir.path(), 10.0);
        assert!(matches!(result, Err(Error::Frames(_))));
    }

    #[test]
    fn scan_sorts_and_filters_by_extension() {
        let dir = tempdir().expect("failed to create temp dir");
        write_frames(dir.path(), &[[0, 0, 0, 255]; 2]);
        fs::write(dir.path().join("readme.md"), b"#").expect("write");

        let frames = scan_frames(dir.path()).expect("scan");
        let names: Vec<_> = frames
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_owned))
            .collect();
        assert_eq!(names, ["frame_000.png", "frame_001.png"]);
    }

    #[tokio::test(start_paused = true)]
    async fn playback_clock_selects_frame() {
        let dir = tempdir().expect("failed to create temp dir");
        write_frames(dir.path(), &[[255, 0, 0, 255], [0, 0, 255, 255]]);
        let video = ImageSequenceVideo::open(dir.path(), 2.0).expect("open");
        assert!(video.is_paused());
        assert_eq!(video.duration(), Duration::from_secs(1));

        let first = video.capture().expect("first frame");
        assert_eq!((first.width(), first.height()), (8, 6));
        assert_eq!(&first.data()[..4], &[255, 0, 0, 255]);

        video.play();
        tokio::time::advance(Duration::from_millis(600)).await;
        assert_eq!(video.current_index(), 1);
        let second = video.capture().expect("second frame");
        assert_eq!(&second.data()[..4], &[0, 0, 255, 255]);
    }

    #[tokio::test(start_paused = true)]
    async fn controls_emit_events() {
        let video = ImageSequenceVideo::from_frames(vec![PathBuf::from("a.png")], 1.0);
        let mut events = video.subscribe();

        video.play();
        video.play();
        video.pause();
        video.seek(Duration::ZERO);

        assert_eq!(events.try_recv().ok(), Some(VideoEvent::Play));
        assert_eq!(events.try_recv().ok(), Some(VideoEvent::Pause));
        assert_eq!(events.try_recv().ok(), Some(VideoEvent::Seeked));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn play_to_end_emits_ended() {
        let video = ImageSequenceVideo::from_frames(
            vec![PathBuf::from("a.png"), PathBuf::from("b.png")],
            4.0,
        );
        let mut events = video.subscribe();

        video.play_to_end().await;

        assert!(video.is_ended());
        assert!(video.is_paused());
        assert_eq!(events.try_recv().ok(), Some(VideoEvent::Play));
        assert_eq!(events.try_recv().ok(), Some(VideoEvent::Ended));
    }

    #[test]
    fn missing_file_capture_is_not_ready() {
        let video = ImageSequenceVideo::from_frames(vec![PathBuf::from("/nonexistent.png")], 1.0);
        assert_eq!(video.capture().unwrap_err(), DetectionError::NotReady);
    }

    #[test]
    fn locator_skips_detached_or_unready_video() {
        let video = FakeVideo::playing();
        let locator = SingleVideoLocator::new(video.clone());
        assert!(locator.find_main_video().is_some());

        video.set_ready(false);
        assert!(locator.find_main_video().is_none());

        video.set_ready(true);
        video.detach();
        assert!(locator.find_main_video().is_none());

        locator.clear();
        assert!(locator.find_main_video().is_none());
        assert!(SingleVideoLocator::empty().find_main_video().is_none());
    }

    #[test]
    fn locator_clones_share_slot() {
        let locator = SingleVideoLocator::empty();
        let shared = locator.clone();
        let video = FakeVideo::playing();

        shared.set(video.clone());
        let found = locator.find_main_video().expect("video");
        assert_eq!(found.id(), video.id());
    }
}
