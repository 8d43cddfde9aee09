// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! # Categories
//!
//! - **Cadence**: Sampling tick and video discovery retry
//! - **Requests**: Engine reply deadline
//! - **Capture**: Pause between draws of a multi-frame pass

// ==========================================================================
// Cadence Defaults
// ==========================================================================

/// Period of the sampling ticker (in milliseconds).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Minimum allowed tick interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 50;

/// Delay before the second attempt to find the main video (in milliseconds).
pub const DEFAULT_LOCATE_RETRY_MS: u64 = 2000;

// ==========================================================================
// Request Defaults
// ==========================================================================

/// Deadline for an inference reply (in milliseconds).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Minimum allowed request timeout.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

// ==========================================================================
// Capture Defaults
// ==========================================================================

/// Pause between consecutive draws of a multi-frame pass (in milliseconds).
pub const DEFAULT_CAPTURE_DELAY_MS: u64 = 5;

/// Maximum allowed capture delay.
pub const MAX_CAPTURE_DELAY_MS: u64 = 200;
