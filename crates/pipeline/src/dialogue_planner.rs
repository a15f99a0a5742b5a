//! Outline validation/normalisation and per-segment dialogue prompt
//! construction, per spec.md §4.6.
//!
//! Grounded on `original_source/app/llm_service.py::_validate_and_adjust_segments`
//! (minimum duration, proportional scaling past a 10% tolerance, word-count
//! recomputation at 150 words/minute) and `_create_fallback_outline`/
//! `_restructure_outline_segments` (the 15/70/15 Intro/Body/Conclusion
//! skeleton synthesized when the LLM returns no usable segments).

use std::collections::{HashMap, HashSet};

use podcast_core::{DialogueTurn, Gender, OutlineSegment, PersonaResearch, PodcastOutline};
use podcast_llm::prompts::RawDialogueTurn;

const MIN_SEGMENT_SECONDS: u32 = 15;
const WORDS_PER_MINUTE: u32 = 150;
const SCALE_TOLERANCE: f64 = 0.1;

/// Validates and time-normalises an LLM-produced outline in place,
/// returning warnings describing any recovery that was applied.
pub fn normalize_outline(outline: &mut PodcastOutline, target_duration_seconds: u32) -> Vec<String> {
    let mut warnings = Vec::new();

    if outline.segments.is_empty() {
        warnings.push("outline had no segments; synthesized a default Intro/Body/Conclusion skeleton".to_string());
        outline.segments = fallback_skeleton(target_duration_seconds);
    }

    dedupe_segment_ids(&mut outline.segments, &mut warnings);

    for segment in &mut outline.segments {
        if segment.estimated_duration_seconds.map(|d| d == 0).unwrap_or(true) {
            segment.estimated_duration_seconds = Some(30);
        }
    }

    let current_total: u32 = outline.segments.iter().map(|s| s.estimated_duration_seconds.unwrap_or(0)).sum();
    let target = target_duration_seconds.max(1);
    let diff = (current_total as i64 - target as i64).unsigned_abs() as f64;
    if current_total > 0 && diff > target as f64 * SCALE_TOLERANCE {
        let scale_factor = target as f64 / current_total as f64;
        for segment in &mut outline.segments {
            let original = segment.estimated_duration_seconds.unwrap_or(0);
            let scaled = ((original as f64) * scale_factor).round() as u32;
            segment.estimated_duration_seconds = Some(scaled.max(MIN_SEGMENT_SECONDS));
        }
    } else {
        warnings.push("duration not scaled".to_string());
        for segment in &mut outline.segments {
            let floor = segment.estimated_duration_seconds.unwrap_or(0).max(MIN_SEGMENT_SECONDS);
            segment.estimated_duration_seconds = Some(floor);
        }
    }

    for segment in &mut outline.segments {
        let seconds = segment.estimated_duration_seconds.unwrap_or(MIN_SEGMENT_SECONDS);
        segment.target_word_count = Some(seconds * WORDS_PER_MINUTE / 60);
    }

    warnings
}

fn dedupe_segment_ids(segments: &mut [OutlineSegment], warnings: &mut Vec<String>) {
    let mut seen = HashSet::new();
    let mut duplicates_found = false;
    for segment in segments.iter_mut() {
        if !seen.insert(segment.segment_id.clone()) {
            duplicates_found = true;
            let mut suffix = 2;
            let mut candidate = format!("{}_{}", segment.segment_id, suffix);
            while !seen.insert(candidate.clone()) {
                suffix += 1;
                candidate = format!("{}_{}", segment.segment_id, suffix);
            }
            segment.segment_id = candidate;
        }
    }
    if duplicates_found {
        warnings.push("duplicate segment IDs found in outline; assigned new unique IDs".to_string());
    }
}

fn fallback_skeleton(target_duration_seconds: u32) -> Vec<OutlineSegment> {
    let intro = (target_duration_seconds as f64 * 0.15).round() as u32;
    let conclusion = (target_duration_seconds as f64 * 0.15).round() as u32;
    let body = target_duration_seconds.saturating_sub(intro).saturating_sub(conclusion);
    vec![
        OutlineSegment {
            segment_id: "intro_1".to_string(),
            segment_title: Some("Introduction".to_string()),
            speaker_id: "Host".to_string(),
            content_cue: "Introduce the topic and speakers.".to_string(),
            target_word_count: None,
            estimated_duration_seconds: Some(intro.max(MIN_SEGMENT_SECONDS)),
        },
        OutlineSegment {
            segment_id: "body_1".to_string(),
            segment_title: Some("Main Discussion".to_string()),
            speaker_id: "Host".to_string(),
            content_cue: "Discuss the main points from the source material.".to_string(),
            target_word_count: None,
            estimated_duration_seconds: Some(body.max(MIN_SEGMENT_SECONDS)),
        },
        OutlineSegment {
            segment_id: "conclusion_1".to_string(),
            segment_title: Some("Conclusion".to_string()),
            speaker_id: "Host".to_string(),
            content_cue: "Summarize the key points and conclude the discussion.".to_string(),
            target_word_count: None,
            estimated_duration_seconds: Some(conclusion.max(MIN_SEGMENT_SECONDS)),
        },
    ]
}

/// Builds the per-segment dialogue generation prompt described in
/// spec.md §4.6: the segment speaker's invented name/real name/profile,
/// the outline's title and theme, the content cue, the target word
/// count, the other available speakers, and any custom instructions.
pub fn segment_prompt(
    outline: &PodcastOutline,
    segment: &OutlineSegment,
    personas: &HashMap<String, PersonaResearch>,
    custom_dialogue_prompt: Option<&str>,
) -> String {
    let unknown_name = "Unknown".to_string();
    let unknown_profile = "No profile available.".to_string();
    let speaker = personas.get(&segment.speaker_id);
    let invented_name = speaker.and_then(|p| p.invented_name.as_deref()).unwrap_or(&segment.speaker_id);
    let real_name = speaker.map(|p| p.name.as_str()).unwrap_or(&unknown_name);
    let profile = speaker.map(|p| p.detailed_profile.as_str()).unwrap_or(&unknown_profile);

    let others: Vec<(String, String)> = personas
        .values()
        .filter(|p| p.person_id != segment.speaker_id)
        .map(|p| (p.person_id.clone(), p.invented_name.clone().unwrap_or_else(|| p.name.clone())))
        .collect();

    podcast_llm::prompts::dialogue_segment_prompt(
        invented_name,
        real_name,
        profile,
        &outline.title_suggestion,
        &outline.summary_suggestion,
        &segment.content_cue,
        segment.target_word_count.unwrap_or(0),
        &others,
        custom_dialogue_prompt,
    )
}

/// Converts one segment's raw LLM turns into domain `DialogueTurn`s,
/// defaulting a missing `speaker_gender` from the persona map (Host falls
/// back to Male, Narrator to Neutral, anything else warns and defaults to
/// Neutral) and renumbering `turn_id` to continue the task-wide monotonic
/// counter. An empty turn list yields a single fallback Host turn rather
/// than leaving the segment silent.
pub fn normalize_segment_turns(
    raw_turns: Vec<RawDialogueTurn>,
    segment: &OutlineSegment,
    personas: &HashMap<String, PersonaResearch>,
    next_turn_id: &mut u32,
    warnings: &mut Vec<String>,
) -> Vec<DialogueTurn> {
    if raw_turns.is_empty() {
        warnings.push(format!("segment '{}' produced no dialogue turns; inserted a fallback line", segment.segment_id));
        let turn = DialogueTurn {
            turn_id: *next_turn_id,
            speaker_id: "Host".to_string(),
            speaker_gender: Some(Gender::Male),
            text: format!("Let's talk about {}", segment.content_cue),
            source_mentions: Vec::new(),
        };
        *next_turn_id += 1;
        return vec![turn];
    }

    raw_turns
        .into_iter()
        .map(|raw| {
            let gender = raw.speaker_gender.as_deref().and_then(parse_gender).or_else(|| {
                personas.get(&raw.speaker_id).and_then(|p| p.gender)
            }).unwrap_or_else(|| default_gender_for(&raw.speaker_id, warnings));
            let turn = DialogueTurn {
                turn_id: *next_turn_id,
                speaker_id: raw.speaker_id,
                speaker_gender: Some(gender),
                text: raw.text,
                source_mentions: raw.source_mentions,
            };
            *next_turn_id += 1;
            turn
        })
        .collect()
}

fn parse_gender(raw: &str) -> Option<Gender> {
    match raw {
        "Male" => Some(Gender::Male),
        "Female" => Some(Gender::Female),
        "Neutral" => Some(Gender::Neutral),
        _ => None,
    }
}

fn default_gender_for(speaker_id: &str, warnings: &mut Vec<String>) -> Gender {
    match speaker_id {
        "Host" => Gender::Male,
        "Narrator" => Gender::Neutral,
        _ => {
            warnings.push(format!("speaker '{speaker_id}' had no resolvable gender; defaulted to Neutral"));
            Gender::Neutral
        }
    }
}
