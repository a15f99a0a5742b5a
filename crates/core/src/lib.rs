//! Core domain types and trait seams for the podcast generation orchestrator.
//!
//! This crate is the foundation every other crate in the workspace depends
//! on: the `Task`/`PodcastRequest`/`PodcastEpisode` family of domain types,
//! the crate-wide `Error`, and the four trait seams (`ContentExtractor`,
//! `LanguageModel`, `TtsBackend`, `AudioStitcher`) that keep external
//! collaborators out of the orchestration logic.

pub mod error;
pub mod model;
pub mod traits;

pub use error::{Error, Result};
pub use model::{
    ArtifactFlags, DialogueTurn, Gender, OutlineSegment, PersonaResearch, PodcastEpisode,
    PodcastOutline, PodcastRequest, SourceAnalysis, Task, TaskStatus, VoiceParams,
};
pub use traits::{
    AudioStitcher, ContentExtractor, ExtractedContent, LanguageModel, RawVoice, TtsBackend, TtsRequest,
};
