// SPDX-License-Identifier: MPL-2.0
//! Crate-level error types.
//!
//! [`DetectionError`] is the failure taxonomy carried by inference results
//! and sampling passes. It never aborts the coordinator: every variant is
//! logged and the next tick acts as the retry. [`Error`] covers fallible
//! I/O in the infrastructure adapters and the binary.

use thiserror::Error;

/// Failures of a single detection pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    /// The video source has no decodable frame yet. Sampling is skipped.
    #[error("Video source is not ready")]
    NotReady,

    /// No engine reply arrived before the request deadline.
    #[error("Request timeout")]
    RequestTimeout,

    /// The engine reported a failure.
    #[error("{0}")]
    EngineFailure(String),

    /// The engine rejected a malformed frame batch.
    #[error("Invalid frames data: {0}")]
    InvalidPayload(String),

    /// The request was force-resolved because detection was torn down.
    #[error("Request cancelled: {0}")]
    Cancelled(String),
}

impl DetectionError {
    /// Returns true for failures caused by the video source rather than the engine.
    #[must_use]
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::NotReady)
    }
}

/// Errors raised by infrastructure adapters.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Settings Error: {0}")]
    Settings(String),

    #[error("Protocol Error: {0}")]
    Protocol(#[from] crate::application::protocol::ProtocolError),

    #[error("Model Error: {0}")]
    Backend(#[from] crate::application::port::BackendError),

    #[error("Frame Source Error: {0}")]
    Frames(String),

    #[error("Argument Error: {0}")]
    Args(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<pico_args::Error> for Error {
    fn from(err: pico_args::Error) -> Self {
        Error::Args(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_timeout_displays_wire_message() {
        assert_eq!(DetectionError::RequestTimeout.to_string(), "Request timeout");
    }

    #[test]
    fn engine_failure_displays_raw_message() {
        let err = DetectionError::EngineFailure("Model not loaded yet".into());
        assert_eq!(err.to_string(), "Model not loaded yet");
    }

    #[test]
    fn not_ready_is_a_source_failure() {
        assert!(DetectionError::NotReady.is_source_failure());
        assert!(!DetectionError::RequestTimeout.is_source_failure());
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let err: Error = std::io::Error::other("boom").into();
        match err {
            Error::Io(inner) => assert!(inner.to_string().contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn config_error_formats_properly() {
        let err = Error::Config("bad field".into());
        assert_eq!(format!("{}", err), "Config Error: bad field");
    }
}
