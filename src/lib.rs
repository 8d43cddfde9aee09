// SPDX-License-Identifier: MPL-2.0
//! `ad_lens` detects advertisements in a playing video.
//!
//! It samples frames from the bound video, sends them to an isolated
//! inference engine, and smooths the per-frame probabilities into a stable
//! ad/non-ad decision that drives an on-screen marker.

#![doc(html_root_url = "https://docs.rs/ad_lens/0.1.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod paths;

#[cfg(test)]
pub mod test_utils;
