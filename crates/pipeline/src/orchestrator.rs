//! The `Pipeline`: runs one task's phases in strict sequence, per
//! spec.md §4.3. All mutation of the `Task` record goes through
//! `StatusStore`; the `Pipeline` itself is stateless between `run` calls
//! other than the injected collaborators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use podcast_core::{
    ContentExtractor, ExtractedContent, LanguageModel, PersonaResearch, PodcastEpisode, PodcastOutline,
    PodcastRequest, TtsBackend,
};
use podcast_llm::parsing::parse_structured;
use podcast_llm::prompts::{
    outline_prompt, persona_research_prompt, source_analysis_prompt, RawDialogueTurn, RawOutline,
    RawPersonaResearch, RawSourceAnalysis,
};
use podcast_status::{ArtifactKind, StatusStore};
use podcast_voice::{PersonaAllocator, PersonaInput, VoiceCatalog};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::audio_assembler::synthesize_turns;
use crate::dialogue_planner::{normalize_outline, normalize_segment_turns, segment_prompt};
use crate::duration::parse_duration;
use crate::error::{PipelineError, Result};

/// Collaborators the `Pipeline` needs but does not itself construct,
/// following spec.md §9's call to replace singleton globals with
/// explicitly injected services.
pub struct PipelineDeps {
    pub url_extractor: Arc<dyn ContentExtractor>,
    pub pdf_extractor: Arc<dyn ContentExtractor>,
    pub llm: Arc<dyn LanguageModel>,
    pub llm_semaphore: Arc<Semaphore>,
    pub tts_backend: Arc<dyn TtsBackend>,
    pub tts_semaphore: Arc<Semaphore>,
    pub audio_stitcher: Arc<dyn podcast_core::AudioStitcher>,
    pub voice_catalog: Arc<VoiceCatalog>,
    pub status: Arc<StatusStore>,
    pub output_root: PathBuf,
}

pub struct Pipeline {
    deps: PipelineDeps,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }

    /// Runs every phase for `task_id` in order, writing progress to the
    /// `StatusStore` at each anchor. Returns `Ok(())` once the task has
    /// reached a terminal state; phase-level recoverable failures are
    /// folded into warnings rather than returned here.
    pub async fn run(&self, task_id: Uuid, request: PodcastRequest, cancellation: CancellationToken) -> Result<()> {
        match self.run_inner(task_id, &request, &cancellation).await {
            Ok(()) => Ok(()),
            Err(PipelineError::Cancelled) => {
                let _ = self.deps.status.update(task_id, podcast_core::TaskStatus::Cancelled, "cancelled", None);
                Ok(())
            }
            Err(err) => {
                let core_err: podcast_core::Error = err.into();
                let _ = self.deps.status.set_error(task_id, "Generation Failed", &core_err.to_string());
                Ok(())
            }
        }
    }

    async fn run_inner(&self, task_id: Uuid, request: &PodcastRequest, cancellation: &CancellationToken) -> Result<()> {
        let task_dir = self.deps.output_root.join(task_id.to_string());
        tokio::fs::create_dir_all(&task_dir).await.map_err(podcast_core::Error::from)?;

        self.deps.status.update(
            task_id,
            podcast_core::TaskStatus::Preprocessing,
            "Validating request and preparing sources",
            None,
        )?;
        check_cancellation(cancellation)?;

        // Phase 1: source ingestion.
        let (combined_text, source_attributions, mut warnings) = self.ingest_sources(request).await?;
        self.deps.status.set_artifact(task_id, ArtifactKind::SourceContent)?;

        self.deps.status.update(
            task_id,
            podcast_core::TaskStatus::AnalyzingSources,
            "Content extracted successfully, analyzing sources",
            None,
        )?;
        check_cancellation(cancellation)?;

        // Phase 2: source analysis.
        let source_analysis_path = task_dir.join("source_analysis.json");
        let source_analysis = self.analyze_source(&combined_text, &mut warnings).await;
        if let Some(analysis) = &source_analysis {
            write_json(&source_analysis_path, analysis).await.map_err(podcast_core::Error::from)?;
            self.deps.status.set_artifact(task_id, ArtifactKind::SourceAnalysis)?;
        }

        self.deps.status.update(
            task_id,
            podcast_core::TaskStatus::ResearchingPersonas,
            "Content analyzed, researching personas",
            None,
        )?;
        check_cancellation(cancellation)?;

        // Phase 3: persona research + voice/name assignment.
        let persona_inputs = self.research_personas(request, &combined_text, &mut warnings).await;
        let allocator = PersonaAllocator::new(&self.deps.voice_catalog);
        let allocation = allocator
            .assign(
                persona_inputs,
                request.host_invented_name.as_deref(),
                request.host_gender,
                self.deps.tts_backend.as_ref(),
            )
            .await;
        warnings.extend(allocation.warnings);

        let mut persona_map: HashMap<String, PersonaResearch> = HashMap::new();
        let mut persona_paths = Vec::new();
        for persona in &allocation.personas {
            let path = task_dir.join(format!("persona_research_{}.json", persona.person_id));
            write_json(&path, persona).await.map_err(podcast_core::Error::from)?;
            persona_paths.push(path.to_string_lossy().to_string());
            persona_map.insert(persona.person_id.clone(), persona.clone());
        }
        persona_map.insert(allocation.host.person_id.clone(), allocation.host.clone());
        self.deps.status.set_artifact(task_id, ArtifactKind::PersonaResearch)?;

        self.deps.status.update(
            task_id,
            podcast_core::TaskStatus::GeneratingOutline,
            &format!("Researched {} personas, generating outline", allocation.personas.len()),
            None,
        )?;
        check_cancellation(cancellation)?;

        // Phase 4: outline generation.
        let (target_duration, duration_warning) = parse_duration(&request.desired_podcast_length);
        if let Some(w) = duration_warning {
            warnings.push(w);
        }
        let mut outline = self
            .generate_outline(&combined_text, &source_analysis, &persona_map, request, target_duration, &mut warnings)
            .await?;
        warnings.extend(normalize_outline(&mut outline, target_duration));
        let outline_path = task_dir.join("podcast_outline.json");
        write_json(&outline_path, &outline).await.map_err(podcast_core::Error::from)?;
        self.deps.status.set_artifact(task_id, ArtifactKind::Outline)?;

        self.deps.status.update(task_id, podcast_core::TaskStatus::GeneratingDialogue, "Writing dialogue", None)?;
        check_cancellation(cancellation)?;

        // Phase 5: dialogue generation.
        let mut turns = Vec::new();
        let mut next_turn_id = 1u32;
        for segment in &outline.segments {
            check_cancellation(cancellation)?;
            let prompt = segment_prompt(&outline, segment, &persona_map, request.custom_dialogue_prompt.as_deref());
            let raw = self.call_llm(podcast_llm::prompts::DIALOGUE_SYSTEM, &prompt).await;
            let raw_turns: Vec<RawDialogueTurn> = match raw {
                Ok(text) => match parse_structured::<Vec<RawDialogueTurn>>(&text) {
                    Ok(outcome) => {
                        if outcome.recovered {
                            warnings.push(format!("dialogue for segment '{}' required lenient JSON recovery", segment.segment_id));
                        }
                        outcome.value
                    }
                    Err(e) => {
                        warnings.push(format!("dialogue for segment '{}' failed to parse: {e}", segment.segment_id));
                        Vec::new()
                    }
                },
                Err(e) => {
                    warnings.push(format!("dialogue generation for segment '{}' failed: {e}", segment.segment_id));
                    Vec::new()
                }
            };
            let segment_turns = normalize_segment_turns(raw_turns, segment, &persona_map, &mut next_turn_id, &mut warnings);
            turns.extend(segment_turns);
        }
        if turns.is_empty() {
            return Err(PipelineError::DialogueUnusable);
        }
        let dialogue_path = task_dir.join("dialogue_turns.json");
        write_json(&dialogue_path, &turns).await.map_err(podcast_core::Error::from)?;
        self.deps.status.set_artifact(task_id, ArtifactKind::DialogueScript)?;

        self.deps.status.update(
            task_id,
            podcast_core::TaskStatus::GeneratingAudio,
            "Synthesizing audio",
            None,
        )?;
        check_cancellation(cancellation)?;

        // Phase 6: audio synthesis.
        let audio_dir = task_dir.join("audio_segments");
        let mut all_personas: Vec<PersonaResearch> = allocation.personas.clone();
        all_personas.push(allocation.host.clone());
        let status = self.deps.status.clone();
        let outcome = synthesize_turns(
            &turns,
            &all_personas,
            &audio_dir,
            self.deps.tts_backend.clone(),
            self.deps.tts_semaphore.clone(),
            cancellation,
            |done, total| {
                let progress = 75.0 + (done as f32 / total.max(1) as f32) * 15.0;
                let _ = status.update_progress(task_id, progress);
            },
        )
        .await?;
        warnings.extend(outcome.warnings);
        self.deps.status.set_artifact(task_id, ArtifactKind::AudioSegments)?;

        self.deps.status.update(task_id, podcast_core::TaskStatus::Stitching, "Stitching final audio", None)?;
        check_cancellation(cancellation)?;

        // Phase 7: stitching.
        let ordered_paths: Vec<String> = outcome.segments.iter().map(|(_, path)| path.clone()).collect();
        let final_path = task_dir.join("final.wav");
        self.deps.audio_stitcher.stitch(&ordered_paths, &final_path.to_string_lossy()).await?;

        self.deps
            .status
            .update(task_id, podcast_core::TaskStatus::PostprocessingFinal, "Finalizing episode", None)?;
        check_cancellation(cancellation)?;

        // Phase 8: finalisation.
        let transcript = render_transcript(&turns, &persona_map);
        let episode = PodcastEpisode {
            title: outline.title_suggestion.clone(),
            summary: outline.summary_suggestion.clone(),
            transcript,
            audio_filepath: final_path.to_string_lossy().to_string(),
            source_attributions,
            warnings: warnings.clone(),
            source_analysis_path: Some(source_analysis_path.to_string_lossy().to_string()),
            persona_research_paths: persona_paths,
            outline_path: Some(outline_path.to_string_lossy().to_string()),
            dialogue_turns_path: Some(dialogue_path.to_string_lossy().to_string()),
        };
        for warning in &warnings {
            self.deps.status.append_warning(task_id, warning.clone())?;
        }
        self.deps.status.set_episode(task_id, episode)?;
        self.deps.status.set_artifact(task_id, ArtifactKind::FinalAudio)?;
        self.deps.status.set_artifact(task_id, ArtifactKind::FinalTranscript)?;
        self.deps.status.update(task_id, podcast_core::TaskStatus::Completed, "Podcast generation complete", None)?;

        Ok(())
    }

    async fn ingest_sources(&self, request: &PodcastRequest) -> Result<(String, Vec<String>, Vec<String>)> {
        let mut extracted_texts = Vec::new();
        let mut attributions = Vec::new();
        let mut warnings = Vec::new();

        for url in &request.source_urls {
            match self.deps.url_extractor.extract(url).await {
                Ok(ExtractedContent { text, attribution }) if !text.trim().is_empty() => {
                    extracted_texts.push(text);
                    attributions.push(attribution);
                }
                Ok(_) => warnings.push(format!("empty content extracted from {url}")),
                Err(e) => warnings.push(format!("failed to extract content from {url}: {e}")),
            }
        }

        if extracted_texts.is_empty() {
            if let Some(pdf_path) = &request.source_pdf_path {
                match self.deps.pdf_extractor.extract(pdf_path).await {
                    Ok(ExtractedContent { text, attribution }) if !text.trim().is_empty() => {
                        extracted_texts.push(text);
                        attributions.push(attribution);
                    }
                    Ok(_) => warnings.push(format!("empty content extracted from PDF {pdf_path}")),
                    Err(e) => warnings.push(format!("failed to extract content from PDF {pdf_path}: {e}")),
                }
            }
        }

        if let Some(text) = &request.source_text {
            if !text.trim().is_empty() {
                extracted_texts.push(text.clone());
                attributions.push("inline source_text".to_string());
            }
        }

        if extracted_texts.is_empty() {
            return Err(PipelineError::NoContentExtracted);
        }

        let combined = extracted_texts
            .iter()
            .enumerate()
            .map(|(i, text)| format!("\n\n--- SOURCE {}: {} ---\n\n{text}", i + 1, attributions[i]))
            .collect::<String>();

        Ok((combined, attributions, warnings))
    }

    async fn analyze_source(&self, combined_text: &str, warnings: &mut Vec<String>) -> Option<podcast_core::SourceAnalysis> {
        let prompt = source_analysis_prompt(combined_text, None);
        match self.call_llm(podcast_llm::prompts::SOURCE_ANALYSIS_SYSTEM, &prompt).await {
            Ok(text) => match parse_structured::<RawSourceAnalysis>(&text) {
                Ok(outcome) => {
                    if outcome.recovered {
                        warnings.push("source analysis required lenient JSON recovery".to_string());
                    }
                    Some(podcast_core::SourceAnalysis {
                        summary_points: outcome.value.summary_points,
                        detailed_analysis: outcome.value.detailed_analysis,
                    })
                }
                Err(e) => {
                    warnings.push(format!("LLM source analysis failed: {e}"));
                    None
                }
            },
            Err(e) => {
                warnings.push(format!("LLM source analysis failed: {e}"));
                None
            }
        }
    }

    async fn research_personas(
        &self,
        request: &PodcastRequest,
        combined_text: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<PersonaInput> {
        let mut inputs = Vec::new();
        for person_name in &request.prominent_persons {
            let prompt = persona_research_prompt(person_name, combined_text);
            match self.call_llm(podcast_llm::prompts::PERSONA_RESEARCH_SYSTEM, &prompt).await {
                Ok(text) => match parse_structured::<RawPersonaResearch>(&text) {
                    Ok(outcome) => {
                        if outcome.recovered {
                            warnings.push(format!("persona research for '{person_name}' required lenient JSON recovery"));
                        }
                        let gender = outcome.value.gender.as_deref().and_then(|g| match g {
                            "Male" => Some(podcast_core::Gender::Male),
                            "Female" => Some(podcast_core::Gender::Female),
                            "Neutral" => Some(podcast_core::Gender::Neutral),
                            _ => None,
                        });
                        inputs.push(PersonaInput {
                            person_id: slugify(person_name),
                            name: person_name.clone(),
                            detailed_profile: outcome.value.detailed_profile,
                            gender,
                            source_context: None,
                        });
                    }
                    Err(e) => warnings.push(format!("persona research for '{person_name}' failed to produce a result: {e}")),
                },
                Err(e) => warnings.push(format!("persona research for '{person_name}' failed: {e}")),
            }
        }
        inputs
    }

    #[allow(clippy::too_many_arguments)]
    async fn generate_outline(
        &self,
        combined_text: &str,
        source_analysis: &Option<podcast_core::SourceAnalysis>,
        persona_map: &HashMap<String, PersonaResearch>,
        request: &PodcastRequest,
        target_duration: u32,
        warnings: &mut Vec<String>,
    ) -> Result<PodcastOutline> {
        let analysis_text = source_analysis.as_ref().map(|a| a.detailed_analysis.clone()).unwrap_or_default();
        let summaries: Vec<(String, String)> = persona_map
            .values()
            .map(|p| (p.person_id.clone(), p.invented_name.clone().unwrap_or_else(|| p.name.clone())))
            .collect();
        let prompt = outline_prompt(
            combined_text,
            &analysis_text,
            &summaries,
            target_duration,
            request.custom_outline_prompt.as_deref(),
        );
        match self.call_llm(podcast_llm::prompts::OUTLINE_SYSTEM, &prompt).await {
            Ok(text) => match parse_structured::<RawOutline>(&text) {
                Ok(outcome) => {
                    if outcome.recovered {
                        warnings.push("outline generation required lenient JSON recovery".to_string());
                    }
                    Ok(PodcastOutline {
                        title_suggestion: outcome.value.title_suggestion,
                        summary_suggestion: outcome.value.summary_suggestion,
                        segments: outcome
                            .value
                            .segments
                            .into_iter()
                            .map(|s| podcast_core::OutlineSegment {
                                segment_id: s.segment_id,
                                segment_title: s.segment_title,
                                speaker_id: s.speaker_id,
                                content_cue: s.content_cue,
                                target_word_count: None,
                                estimated_duration_seconds: s.estimated_duration_seconds,
                            })
                            .collect(),
                    })
                }
                Err(e) => {
                    warnings.push(format!("outline generation failed to parse, using default skeleton: {e}"));
                    Ok(PodcastOutline {
                        title_suggestion: "Generated Podcast".to_string(),
                        summary_suggestion: "A podcast discussing the provided content.".to_string(),
                        segments: Vec::new(),
                    })
                }
            },
            Err(e) => Err(PipelineError::OutlineUnusable(e.to_string())),
        }
    }

    async fn call_llm(&self, system_prompt: &str, user_prompt: &str) -> podcast_core::Result<String> {
        let _permit = self.deps.llm_semaphore.acquire().await.expect("llm semaphore closed");
        self.deps.llm.generate(system_prompt, user_prompt).await
    }
}

fn check_cancellation(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}

/// Derives a `person_id` from a real name per spec.md §3: lowercase, with
/// runs of non-alphanumeric characters collapsed to a single `_`, and no
/// leading/trailing `_`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

fn render_transcript(turns: &[podcast_core::DialogueTurn], personas: &HashMap<String, PersonaResearch>) -> String {
    turns
        .iter()
        .map(|turn| {
            let name = personas
                .get(&turn.speaker_id)
                .and_then(|p| p.invented_name.as_deref())
                .unwrap_or(&turn.speaker_id);
            format!("{name}: {}", turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let body = serde_json::to_string_pretty(value).expect("domain types always serialize");
    tokio::fs::write(path, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_core::RawVoice;
    use podcast_llm::mock::MockLanguageModel;
    use podcast_status::StatusStore;
    use podcast_tts::{ConcatenatingStitcher, MockTtsBackend};
    use podcast_voice::VoiceCatalog;
    use std::time::Duration;

    #[test]
    fn slugify_collapses_non_alphanumerics_and_lowercases() {
        assert_eq!(slugify("Alan Turing"), "alan_turing");
        assert_eq!(slugify("Dr. Ada Lovelace!!"), "dr_ada_lovelace");
        assert_eq!(slugify("  Leading/Trailing  "), "leading_trailing");
    }

    struct StubExtractor(&'static str);

    #[async_trait::async_trait]
    impl ContentExtractor for StubExtractor {
        async fn extract(&self, url: &str) -> podcast_core::Result<ExtractedContent> {
            Ok(ExtractedContent { text: self.0.to_string(), attribution: url.to_string() })
        }
    }

    fn stub_tts() -> MockTtsBackend {
        MockTtsBackend::new(vec![RawVoice {
            voice_id: "v1".to_string(),
            language_codes: vec!["en-US".to_string()],
            ssml_gender: "FEMALE".to_string(),
        }])
    }

    fn json_response(body: &str) -> String {
        body.to_string()
    }

    #[tokio::test]
    async fn happy_path_no_personas_completes() {
        let dir = tempfile::tempdir().unwrap();
        let responses = vec![
            json_response(r#"{"summary_points":["a"],"detailed_analysis":"analysis"}"#),
            json_response(
                r#"{"title_suggestion":"T","summary_suggestion":"S","segments":[{"segment_id":"s1","segment_title":"Intro","speaker_id":"Host","content_cue":"cue","estimated_duration_seconds":60}]}"#,
            ),
            json_response(r#"[{"speaker_id":"Host","speaker_gender":"Male","text":"Welcome!","source_mentions":[]}]"#),
        ];
        let deps = PipelineDeps {
            url_extractor: Arc::new(StubExtractor("plenty of source words here")),
            pdf_extractor: Arc::new(StubExtractor("pdf text")),
            llm: Arc::new(MockLanguageModel::new(responses)),
            llm_semaphore: Arc::new(Semaphore::new(4)),
            tts_backend: Arc::new(stub_tts()),
            tts_semaphore: Arc::new(Semaphore::new(4)),
            audio_stitcher: Arc::new(ConcatenatingStitcher::default()),
            voice_catalog: Arc::new(VoiceCatalog::new(dir.path().join("cache.json"), Duration::from_secs(86_400))),
            status: Arc::new(StatusStore::new()),
            output_root: dir.path().to_path_buf(),
        };
        let task_id = Uuid::new_v4();
        let request = PodcastRequest {
            source_urls: vec!["https://example.com/a".to_string()],
            source_text: None,
            source_pdf_path: None,
            prominent_persons: Vec::new(),
            desired_podcast_length: "3 minutes".to_string(),
            webhook_url: None,
            user_id: None,
            custom_name_overrides: HashMap::new(),
            custom_outline_prompt: None,
            custom_dialogue_prompt: None,
            host_invented_name: None,
            host_gender: None,
        };
        deps.status.create(task_id, request.clone());
        let pipeline = Pipeline::new(deps);
        pipeline.run(task_id, request, CancellationToken::new()).await.unwrap();

        let task = pipeline.deps.status.get(task_id).unwrap();
        assert_eq!(task.status, podcast_core::TaskStatus::Completed);
        assert_eq!(task.progress_percent, 100.0);
        assert!(task.result.is_some());
        assert!(task.artifacts.has_audio_segments);
        assert!(task.artifacts.has_final_audio);
        assert!(task.artifacts.has_final_transcript);
    }

    #[tokio::test]
    async fn all_sources_failing_yields_failed_with_no_episode() {
        struct FailingExtractor;
        #[async_trait::async_trait]
        impl ContentExtractor for FailingExtractor {
            async fn extract(&self, url: &str) -> podcast_core::Result<ExtractedContent> {
                Err(podcast_core::Error::Extraction(format!("unreachable: {url}")))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let deps = PipelineDeps {
            url_extractor: Arc::new(FailingExtractor),
            pdf_extractor: Arc::new(FailingExtractor),
            llm: Arc::new(MockLanguageModel::new(vec![String::new()])),
            llm_semaphore: Arc::new(Semaphore::new(4)),
            tts_backend: Arc::new(stub_tts()),
            tts_semaphore: Arc::new(Semaphore::new(4)),
            audio_stitcher: Arc::new(ConcatenatingStitcher::default()),
            voice_catalog: Arc::new(VoiceCatalog::new(dir.path().join("cache.json"), Duration::from_secs(86_400))),
            status: Arc::new(StatusStore::new()),
            output_root: dir.path().to_path_buf(),
        };
        let task_id = Uuid::new_v4();
        let request = PodcastRequest {
            source_urls: vec!["https://example.com/broken".to_string()],
            source_text: None,
            source_pdf_path: None,
            prominent_persons: Vec::new(),
            desired_podcast_length: "3 minutes".to_string(),
            webhook_url: None,
            user_id: None,
            custom_name_overrides: HashMap::new(),
            custom_outline_prompt: None,
            custom_dialogue_prompt: None,
            host_invented_name: None,
            host_gender: None,
        };
        deps.status.create(task_id, request.clone());
        let pipeline = Pipeline::new(deps);
        pipeline.run(task_id, request, CancellationToken::new()).await.unwrap();

        let task = pipeline.deps.status.get(task_id).unwrap();
        assert_eq!(task.status, podcast_core::TaskStatus::Failed);
        assert!(task.result.is_none());
        assert!(task.error_message.as_ref().unwrap().contains("No Content Extracted"));
    }

    #[tokio::test]
    async fn cancellation_before_start_reaches_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let deps = PipelineDeps {
            url_extractor: Arc::new(StubExtractor("text")),
            pdf_extractor: Arc::new(StubExtractor("text")),
            llm: Arc::new(MockLanguageModel::new(vec![String::new()])),
            llm_semaphore: Arc::new(Semaphore::new(4)),
            tts_backend: Arc::new(stub_tts()),
            tts_semaphore: Arc::new(Semaphore::new(4)),
            audio_stitcher: Arc::new(ConcatenatingStitcher::default()),
            voice_catalog: Arc::new(VoiceCatalog::new(dir.path().join("cache.json"), Duration::from_secs(86_400))),
            status: Arc::new(StatusStore::new()),
            output_root: dir.path().to_path_buf(),
        };
        let task_id = Uuid::new_v4();
        let request = PodcastRequest {
            source_urls: vec!["https://example.com/a".to_string()],
            source_text: None,
            source_pdf_path: None,
            prominent_persons: Vec::new(),
            desired_podcast_length: "3 minutes".to_string(),
            webhook_url: None,
            user_id: None,
            custom_name_overrides: HashMap::new(),
            custom_outline_prompt: None,
            custom_dialogue_prompt: None,
            host_invented_name: None,
            host_gender: None,
        };
        deps.status.create(task_id, request.clone());
        let pipeline = Pipeline::new(deps);
        let token = CancellationToken::new();
        token.cancel();
        pipeline.run(task_id, request, token).await.unwrap();

        let task = pipeline.deps.status.get(task_id).unwrap();
        assert_eq!(task.status, podcast_core::TaskStatus::Cancelled);
    }
}
