//! TTS backend adapter and audio segment stitching.
//!
//! The `AudioAssembler` (in `podcast-pipeline`) only ever depends on
//! [`podcast_core::TtsBackend`] and [`podcast_core::AudioStitcher`]; this
//! crate supplies the HTTP-backed implementation of both plus an
//! in-memory test double.

pub mod client;
pub mod error;
pub mod mock;
pub mod stitcher;

pub use client::{HttpTtsBackend, HttpTtsConfig};
pub use error::TtsError;
pub use mock::MockTtsBackend;
pub use stitcher::ConcatenatingStitcher;
