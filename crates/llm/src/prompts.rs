//! Prompt construction and the raw structured shapes the LLM is asked to
//! return, before they are folded into the domain's richer [`podcast_core`]
//! types. Grounded on `original_source/app/llm_service.py`'s prompt
//! templates (`SOURCE_ANALYSIS_TEMPLATE`, `PERSONA_RESEARCH_TEMPLATE`,
//! the outline and dialogue generation prompts).

use serde::Deserialize;

/// Raw shape requested of the LLM for phase 2 (source analysis).
#[derive(Debug, Deserialize)]
pub struct RawSourceAnalysis {
    pub summary_points: Vec<String>,
    pub detailed_analysis: String,
}

/// Raw shape requested of the LLM for phase 3 (persona research). The
/// assignment fields (`invented_name`, voice) are filled in afterward by
/// `podcast-voice`'s `PersonaAllocator`, not the LLM, except that the LLM
/// may optionally suggest an invented name.
#[derive(Debug, Deserialize)]
pub struct RawPersonaResearch {
    pub detailed_profile: String,
    pub gender: Option<String>,
    #[serde(default)]
    pub invented_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawOutlineSegment {
    pub segment_id: String,
    pub segment_title: Option<String>,
    pub speaker_id: String,
    pub content_cue: String,
    pub estimated_duration_seconds: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RawOutline {
    pub title_suggestion: String,
    pub summary_suggestion: String,
    pub segments: Vec<RawOutlineSegment>,
}

#[derive(Debug, Deserialize)]
pub struct RawDialogueTurn {
    pub speaker_id: String,
    pub speaker_gender: Option<String>,
    pub text: String,
    #[serde(default)]
    pub source_mentions: Vec<String>,
}

pub const SOURCE_ANALYSIS_SYSTEM: &str = "You are a research assistant that distills source material into a \
structured analysis. Respond with a single JSON object matching the requested schema and nothing else.";

pub fn source_analysis_prompt(combined_source_text: &str, custom_instructions: Option<&str>) -> String {
    let instructions = custom_instructions.unwrap_or(
        "Summarize the key points and produce a detailed analysis suitable for planning a podcast episode.",
    );
    format!(
        "{instructions}\n\nRespond as JSON: {{\"summary_points\": [string, ...], \"detailed_analysis\": string}}\n\n\
Analyze the following text:\n\n---\n{combined_source_text}\n---"
    )
}

pub const PERSONA_RESEARCH_SYSTEM: &str = "You are a research assistant profiling a real person mentioned in \
source material for a podcast appearance. Respond with a single JSON object matching the requested schema and \
nothing else.";

pub fn persona_research_prompt(person_name: &str, source_text: &str) -> String {
    format!(
        "Research {person_name} using the source text below. Produce a detailed multi-section profile covering \
their background, relevant expertise, and notable viewpoints as they relate to the source material.\n\n\
Respond as JSON: {{\"detailed_profile\": string, \"gender\": \"Male\"|\"Female\"|\"Neutral\", \
\"invented_name\": string (a plausible stage name for {person_name}, optional)}}\n\n\
Source text:\n\n---\n{source_text}\n---"
    )
}

pub const OUTLINE_SYSTEM: &str = "You are a podcast producer planning a multi-speaker episode outline. Respond \
with a single JSON object matching the requested schema and nothing else.";

pub fn outline_prompt(
    combined_source_text: &str,
    source_analysis: &str,
    persona_summaries: &[(String, String)],
    target_duration_seconds: u32,
    custom_prompt: Option<&str>,
) -> String {
    let personas = persona_summaries
        .iter()
        .map(|(id, summary)| format!("- {id}: {summary}"))
        .collect::<Vec<_>>()
        .join("\n");
    let custom = custom_prompt.map(|p| format!("\nAdditional instructions: {p}\n")).unwrap_or_default();
    format!(
        "Plan a podcast episode of approximately {target_duration_seconds} seconds using the speakers below.\n\
Speakers:\n{personas}\n{custom}\n\
Respond as JSON: {{\"title_suggestion\": string, \"summary_suggestion\": string, \"segments\": \
[{{\"segment_id\": string, \"segment_title\": string, \"speaker_id\": string, \"content_cue\": string, \
\"estimated_duration_seconds\": number}}, ...]}}\n\n\
Source analysis:\n{source_analysis}\n\n\
Source text:\n\n---\n{combined_source_text}\n---"
    )
}

pub const DIALOGUE_SYSTEM: &str = "You are a podcast script writer generating natural, speaker-attributed \
dialogue for one segment of an episode. Respond with a single JSON array matching the requested schema and \
nothing else.";

/// Builds the per-segment dialogue prompt, per spec.md §4.6: invented
/// name, real name, profile, outline title/theme, content cue, target word
/// count, other available speakers, and the user's custom dialogue prompt
/// if provided.
#[allow(clippy::too_many_arguments)]
pub fn dialogue_segment_prompt(
    speaker_invented_name: &str,
    speaker_real_name: &str,
    speaker_profile: &str,
    outline_title: &str,
    outline_theme: &str,
    content_cue: &str,
    target_word_count: u32,
    other_speakers: &[(String, String)],
    custom_prompt: Option<&str>,
) -> String {
    let others = other_speakers
        .iter()
        .map(|(id, name)| format!("- {id} ({name})"))
        .collect::<Vec<_>>()
        .join("\n");
    let custom = custom_prompt.map(|p| format!("\nAdditional instructions: {p}\n")).unwrap_or_default();
    format!(
        "Write this segment of the episode \"{outline_title}\" (theme: {outline_theme}).\n\n\
Primary speaker for this segment: {speaker_invented_name} (based on {speaker_real_name}).\n\
Speaker profile: {speaker_profile}\n\n\
Other available speakers who may also appear in this segment:\n{others}\n{custom}\n\
Content cue: {content_cue}\n\
Target length: approximately {target_word_count} words.\n\n\
Respond as a JSON array of turns: [{{\"speaker_id\": string, \"speaker_gender\": \"Male\"|\"Female\"|\"Neutral\", \
\"text\": string, \"source_mentions\": [string, ...]}}, ...]"
    )
}
