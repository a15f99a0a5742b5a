//! Domain entities shared by every crate in the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A request to generate a podcast episode, as received by the API facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastRequest {
    /// Remote URLs to fetch and combine as source material.
    #[serde(default)]
    pub source_urls: Vec<String>,

    /// Raw source text supplied directly instead of (or alongside) URLs.
    #[serde(default)]
    pub source_text: Option<String>,

    /// Local filesystem path to a PDF to combine with `source_urls`.
    #[serde(default)]
    pub source_pdf_path: Option<String>,

    /// Names the requester wants researched as speaking personas, beyond
    /// whatever the LLM identifies unprompted in the source material.
    #[serde(default)]
    pub prominent_persons: Vec<String>,

    /// Free-text desired length, e.g. "10 minutes", "1 hour".
    #[serde(default = "default_podcast_length")]
    pub desired_podcast_length: String,

    /// Optional callback notified on terminal status.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Opaque caller identifier, carried through to the webhook payload.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Per-persona name/voice overrides keyed by `person_id`.
    #[serde(default)]
    pub custom_name_overrides: HashMap<String, String>,

    /// Additional instructions folded into the outline-generation prompt.
    #[serde(default)]
    pub custom_outline_prompt: Option<String>,

    /// Additional instructions folded into every dialogue-segment prompt.
    #[serde(default)]
    pub custom_dialogue_prompt: Option<String>,

    /// Caller-chosen invented name for the synthetic Host persona.
    #[serde(default)]
    pub host_invented_name: Option<String>,

    /// Caller-chosen gender for the synthetic Host persona.
    #[serde(default)]
    pub host_gender: Option<Gender>,
}

impl PodcastRequest {
    /// spec.md §3: at least one source URL or PDF must be present.
    pub fn validate(&self) -> Result<(), String> {
        if self.source_urls.is_empty() && self.source_pdf_path.is_none() && self.source_text.is_none() {
            return Err("at least one source_url or source_pdf_path must be present".to_string());
        }
        Ok(())
    }
}

fn default_podcast_length() -> String {
    "5 minutes".to_string()
}

/// Gender bucket used to select a TTS voice family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Gender {
    Male,
    Female,
    Neutral,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Neutral => "Neutral",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle state of a generation task. Transitions are one-directional;
/// `StatusStore` rejects anything not in the forward table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Preprocessing,
    AnalyzingSources,
    ResearchingPersonas,
    GeneratingOutline,
    GeneratingDialogue,
    GeneratingAudio,
    Stitching,
    PostprocessingFinal,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Approximate completion percentage for this phase, used as the
    /// progress anchor before any within-phase interpolation.
    pub fn anchor_percent(&self) -> f32 {
        match self {
            TaskStatus::Queued => 0.0,
            TaskStatus::Preprocessing => 5.0,
            TaskStatus::AnalyzingSources => 15.0,
            TaskStatus::ResearchingPersonas => 30.0,
            TaskStatus::GeneratingOutline => 45.0,
            TaskStatus::GeneratingDialogue => 60.0,
            TaskStatus::GeneratingAudio => 75.0,
            TaskStatus::Stitching => 90.0,
            TaskStatus::PostprocessingFinal => 95.0,
            TaskStatus::Completed => 100.0,
            TaskStatus::Failed | TaskStatus::Cancelled => 0.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether `self -> next` is a legal forward transition.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        if self.is_terminal() {
            return false;
        }
        if matches!(next, Failed | Cancelled) {
            return true;
        }
        matches!(
            (self, next),
            (Queued, Preprocessing)
                | (Preprocessing, AnalyzingSources)
                | (AnalyzingSources, ResearchingPersonas)
                | (ResearchingPersonas, GeneratingOutline)
                | (GeneratingOutline, GeneratingDialogue)
                | (GeneratingDialogue, GeneratingAudio)
                | (GeneratingAudio, Stitching)
                | (Stitching, PostprocessingFinal)
                | (PostprocessingFinal, Completed)
        )
    }
}

/// Which intermediate/final artifacts have been persisted for a task so
/// far. Mirrors spec.md §3's eight independently-set `ArtifactFlags`
/// booleans exactly — `source_content_extracted` and
/// `source_analysis_complete` are distinct phases (extraction can
/// succeed while the LLM analysis of it still fails), and likewise
/// `final_podcast_audio_available` and `final_podcast_transcript_available`
/// are set at different points of finalisation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ArtifactFlags {
    pub has_source_content: bool,
    pub has_source_analysis: bool,
    pub has_persona_research: bool,
    pub has_outline: bool,
    pub has_dialogue_script: bool,
    pub has_audio_segments: bool,
    pub has_final_audio: bool,
    pub has_final_transcript: bool,
}

/// A generation job tracked end to end by the `StatusStore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub status_message: String,
    pub progress_percent: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub request: PodcastRequest,
    pub artifacts: ArtifactFlags,
    pub warnings: Vec<String>,
    pub error_message: Option<String>,
    pub result: Option<PodcastEpisode>,
}

impl Task {
    pub fn new(task_id: Uuid, request: PodcastRequest, now: DateTime<Utc>) -> Self {
        Self {
            task_id,
            status: TaskStatus::Queued,
            status_message: "queued".to_string(),
            progress_percent: 0.0,
            created_at: now,
            updated_at: now,
            request,
            artifacts: ArtifactFlags::default(),
            warnings: Vec::new(),
            error_message: None,
            result: None,
        }
    }
}

/// Simplified structured analysis of combined source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAnalysis {
    pub summary_points: Vec<String>,
    pub detailed_analysis: String,
}

/// Speaking-rate/pitch pair assigned to a persona's TTS voice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoiceParams {
    pub speaking_rate: f32,
    pub pitch: f32,
}

/// Profile of a person identified in (or explicitly requested of) the source
/// material, extended with the podcast-speaker assignment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaResearch {
    pub person_id: String,
    pub name: String,
    pub detailed_profile: String,
    pub invented_name: Option<String>,
    pub gender: Option<Gender>,
    pub tts_voice_id: Option<String>,
    pub tts_voice_params: Option<VoiceParams>,
    pub source_context: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

/// One section of the planned episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSegment {
    pub segment_id: String,
    pub segment_title: Option<String>,
    pub speaker_id: String,
    pub content_cue: String,
    pub target_word_count: Option<u32>,
    pub estimated_duration_seconds: Option<u32>,
}

/// The overall structure of the podcast, before dialogue is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastOutline {
    pub title_suggestion: String,
    pub summary_suggestion: String,
    pub segments: Vec<OutlineSegment>,
}

impl PodcastOutline {
    /// Text/markdown rendering used by the `.../outline` derived resource.
    pub fn format_for_display(&self, markdown: bool) -> String {
        let total_seconds: u32 = self
            .segments
            .iter()
            .map(|s| s.estimated_duration_seconds.unwrap_or(0))
            .sum();
        let (min, sec) = (total_seconds / 60, total_seconds % 60);

        let mut lines = Vec::new();
        if markdown {
            lines.push(format!("# {}", self.title_suggestion));
            lines.push(String::new());
            lines.push(format!("**Summary**: {}", self.summary_suggestion));
            lines.push(String::new());
            lines.push(format!(
                "**Total Duration**: {min} min {sec} sec ({total_seconds} seconds)"
            ));
            lines.push(format!("**Number of Segments**: {}", self.segments.len()));
            lines.push(String::new());
            lines.push("## Segments".to_string());
            for (i, seg) in self.segments.iter().enumerate() {
                let d = seg.estimated_duration_seconds.unwrap_or(0);
                lines.push(format!(
                    "### {}. {} ({}:{:02})",
                    i + 1,
                    seg.segment_title.as_deref().unwrap_or("Untitled Segment"),
                    d / 60,
                    d % 60
                ));
                lines.push(format!("**Speaker**: {}", seg.speaker_id));
                lines.push(String::new());
                lines.push(seg.content_cue.clone());
                lines.push(String::new());
            }
        } else {
            lines.push(format!("Title: {}", self.title_suggestion));
            lines.push(format!("Summary: {}", self.summary_suggestion));
            lines.push(format!(
                "Total Duration: {min} min {sec} sec ({total_seconds} seconds)"
            ));
            lines.push(format!("Number of Segments: {}", self.segments.len()));
            lines.push(String::new());
            lines.push("SEGMENTS:".to_string());
            lines.push("-".repeat(80));
            for (i, seg) in self.segments.iter().enumerate() {
                let d = seg.estimated_duration_seconds.unwrap_or(0);
                lines.push(format!(
                    "{}. {} ({}:{:02})",
                    i + 1,
                    seg.segment_title.as_deref().unwrap_or("Untitled Segment"),
                    d / 60,
                    d % 60
                ));
                lines.push(format!("   Speaker: {}", seg.speaker_id));
                lines.push(format!("   Content: {}", seg.content_cue));
                lines.push("-".repeat(80));
            }
        }
        lines.join("\n")
    }
}

/// A single line of the generated script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub turn_id: u32,
    pub speaker_id: String,
    pub speaker_gender: Option<Gender>,
    pub text: String,
    #[serde(default)]
    pub source_mentions: Vec<String>,
}

/// The finished artifact returned to the caller once a task completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastEpisode {
    pub title: String,
    pub summary: String,
    pub transcript: String,
    pub audio_filepath: String,
    pub source_attributions: Vec<String>,
    pub warnings: Vec<String>,
    pub source_analysis_path: Option<String>,
    pub persona_research_paths: Vec<String>,
    pub outline_path: Option<String>,
    pub dialogue_turns_path: Option<String>,
}
