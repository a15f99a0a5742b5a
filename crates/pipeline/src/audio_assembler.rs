//! Per-turn speech synthesis and final stitching, per spec.md §4.7.
//!
//! Turns are synthesized concurrently, bounded by a shared TTS worker
//! semaphore (the `LLM_WORKERS`-style pool described in spec.md §5), with
//! a cancellation check before each new submission. A per-turn failure is
//! recorded as a warning and the turn is skipped; the phase only fails if
//! every turn fails.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use podcast_core::{DialogueTurn, Gender, PersonaResearch, TtsBackend, TtsRequest, VoiceParams};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};

pub struct SynthesisOutcome {
    /// `(turn_id, audio_path)` pairs for turns that synthesized
    /// successfully, in no particular order (the caller sorts by
    /// `turn_id` before stitching).
    pub segments: Vec<(u32, String)>,
    pub warnings: Vec<String>,
}

/// Resolves the voice a turn should be synthesized with: the speaker's
/// assigned persona voice if known, else a gender-based default, else
/// Neutral, per spec.md §4.7 step 1.
fn resolve_voice(turn: &DialogueTurn, personas: &[PersonaResearch]) -> (String, VoiceParams) {
    if let Some(persona) = personas.iter().find(|p| p.person_id == turn.speaker_id || p.invented_name.as_deref() == Some(turn.speaker_id.as_str())) {
        if let (Some(voice_id), Some(params)) = (&persona.tts_voice_id, persona.tts_voice_params) {
            return (voice_id.clone(), params);
        }
    }
    let gender = turn.speaker_gender.unwrap_or(Gender::Neutral);
    let fallback_voice = match gender {
        Gender::Male => "en-US-Chirp3-HD-Male-1",
        Gender::Female => "en-US-Chirp3-HD-Female-1",
        Gender::Neutral => "en-US-Chirp3-HD-Neutral-1",
    };
    (fallback_voice.to_string(), VoiceParams { speaking_rate: 1.0, pitch: 0.0 })
}

#[allow(clippy::too_many_arguments)]
pub async fn synthesize_turns(
    turns: &[DialogueTurn],
    personas: &[PersonaResearch],
    output_dir: &Path,
    backend: Arc<dyn TtsBackend>,
    tts_semaphore: Arc<Semaphore>,
    cancellation: &CancellationToken,
    mut on_progress: impl FnMut(usize, usize) + Send,
) -> Result<SynthesisOutcome> {
    tokio::fs::create_dir_all(output_dir).await.map_err(podcast_core::Error::from)?;

    let completed = Arc::new(AtomicUsize::new(0));
    let total = turns.len();
    let mut futures = FuturesUnordered::new();

    for turn in turns {
        if cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let (voice_id, params) = resolve_voice(turn, personas);
        let output_path = output_dir
            .join(format!("turn_{:03}_{}.wav", turn.turn_id, sanitize(&turn.speaker_id)))
            .to_string_lossy()
            .to_string();
        let request = TtsRequest {
            text: turn.text.clone(),
            voice_id,
            speaking_rate: params.speaking_rate,
            pitch: params.pitch,
            output_path,
        };
        let turn_id = turn.turn_id;
        let speaker_id = turn.speaker_id.clone();
        let backend = backend.clone();
        let semaphore = tts_semaphore.clone();

        futures.push(async move {
            let _permit = semaphore.acquire_owned().await.expect("tts semaphore closed");
            let result = backend.synthesize(&request).await;
            (turn_id, speaker_id, result)
        });
    }

    let mut segments = Vec::new();
    let mut warnings = Vec::new();
    while let Some((turn_id, speaker_id, result)) = futures.next().await {
        completed.fetch_add(1, Ordering::Relaxed);
        on_progress(completed.load(Ordering::Relaxed), total);
        match result {
            Ok(path) => segments.push((turn_id, path)),
            Err(err) => warnings.push(format!("audio synthesis failed for turn {turn_id} ({speaker_id}): {err}")),
        }
    }

    if segments.is_empty() {
        return Err(PipelineError::AllAudioFailed);
    }

    segments.sort_by_key(|(turn_id, _)| *turn_id);
    Ok(SynthesisOutcome { segments, warnings })
}

fn sanitize(s: &str) -> String {
    s.chars().map(|c| if c.is_alphanumeric() { c } else { '_' }).collect()
}
