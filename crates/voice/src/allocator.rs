//! `PersonaAllocator`: assigns invented names and distinct voices to
//! personas and the host, per spec.md §4.4.
//!
//! Grounded on `original_source/app/podcast_workflow.py` lines ~640-810:
//! gender round-robin fallback when a persona's gender isn't specified,
//! invented-name assignment from [`crate::names`], the Host always
//! receiving a voice last (from whatever the guests didn't take), and a
//! post-hoc warning (not a hard failure) when the catalog can't give every
//! persona a unique voice id.

use std::collections::HashSet;

use chrono::Utc;
use podcast_core::{Gender, PersonaResearch, VoiceParams};

use crate::catalog::{chirp3_hd_backup, CatalogVoice, VoiceCatalog};
use crate::names::next_invented_name;

/// One persona as supplied by earlier pipeline phases, before an invented
/// name or voice has been attached.
pub struct PersonaInput {
    pub person_id: String,
    pub name: String,
    pub detailed_profile: String,
    pub gender: Option<Gender>,
    pub source_context: Option<String>,
}

pub struct AllocationResult {
    pub personas: Vec<PersonaResearch>,
    pub host: PersonaResearch,
    pub warnings: Vec<String>,
}

const FALLBACK_GENDER_CYCLE: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Neutral];

pub struct PersonaAllocator<'a> {
    catalog: &'a VoiceCatalog,
}

impl<'a> PersonaAllocator<'a> {
    pub fn new(catalog: &'a VoiceCatalog) -> Self {
        Self { catalog }
    }

    /// Assigns invented names and voices to every guest persona and to the
    /// host. The host is resolved last so it never takes a voice a guest
    /// needed, matching the original's `assign_voices_to_speakers` order.
    ///
    /// `host_invented_name` is the caller-supplied stage name
    /// (`PodcastRequest.host_invented_name`), used literally when present
    /// — matching the original's `host_name = request_data.host_invented_name
    /// or "Brigette"` (`podcast_workflow.py:664`), which never runs the
    /// caller's choice through the name pool. The host's real `name` and
    /// `person_id` are always the literal `"Host"`, never derived from the
    /// caller's invented-name hint.
    pub async fn assign(
        &self,
        personas: Vec<PersonaInput>,
        host_invented_name: Option<&str>,
        host_gender: Option<Gender>,
        backend: &dyn podcast_core::TtsBackend,
    ) -> AllocationResult {
        let mut used_names: HashSet<String> = HashSet::new();
        let mut used_voice_ids: HashSet<String> = HashSet::new();
        let mut warnings = Vec::new();
        let mut assigned = Vec::new();

        for (idx, input) in personas.into_iter().enumerate() {
            let gender = input.gender.unwrap_or(FALLBACK_GENDER_CYCLE[idx % FALLBACK_GENDER_CYCLE.len()]);
            let invented_name = next_invented_name(gender, &used_names);
            used_names.insert(invented_name.clone());

            let voice = self.pick_voice(gender, &used_voice_ids, backend).await;
            used_voice_ids.insert(voice.voice_id.clone());

            assigned.push(PersonaResearch {
                person_id: input.person_id,
                name: input.name,
                detailed_profile: input.detailed_profile,
                invented_name: Some(invented_name),
                gender: Some(gender),
                tts_voice_id: Some(voice.voice_id),
                tts_voice_params: Some(VoiceParams { speaking_rate: voice.speaking_rate, pitch: voice.pitch }),
                source_context: input.source_context,
                creation_date: Some(Utc::now()),
            });
        }

        // Original default is "Female", not round-robin — the host is a
        // fixed role, not a guest drawn from the fallback cycle.
        let host_gender = host_gender.unwrap_or(Gender::Female);
        let host_invented_name = match host_invented_name {
            Some(name) => name.to_string(),
            None => next_invented_name(host_gender, &used_names),
        };
        used_names.insert(host_invented_name.clone());
        let host_voice = self.pick_voice(host_gender, &used_voice_ids, backend).await;
        used_voice_ids.insert(host_voice.voice_id.clone());

        let host = PersonaResearch {
            person_id: "Host".to_string(),
            name: "Host".to_string(),
            detailed_profile: "Guides the conversation and introduces each guest.".to_string(),
            invented_name: Some(host_invented_name),
            gender: Some(host_gender),
            tts_voice_id: Some(host_voice.voice_id),
            tts_voice_params: Some(VoiceParams { speaking_rate: host_voice.speaking_rate, pitch: host_voice.pitch }),
            source_context: None,
            creation_date: Some(Utc::now()),
        };

        let mut all_voice_ids: Vec<&str> =
            assigned.iter().filter_map(|p| p.tts_voice_id.as_deref()).collect();
        if let Some(id) = host.tts_voice_id.as_deref() {
            all_voice_ids.push(id);
        }
        let mut seen = HashSet::new();
        let mut duplicated = false;
        for id in &all_voice_ids {
            if !seen.insert(*id) {
                duplicated = true;
            }
        }
        if duplicated {
            warnings.push(
                "voice catalog could not supply a unique voice for every persona; some speakers share a voice"
                    .to_string(),
            );
        }

        AllocationResult { personas: assigned, host, warnings }
    }

    async fn pick_voice(
        &self,
        gender: Gender,
        used: &HashSet<String>,
        backend: &dyn podcast_core::TtsBackend,
    ) -> CatalogVoice {
        let catalog_voices = self.catalog.voices_for(gender, backend).await;
        if let Some(voice) = catalog_voices.iter().find(|v| !used.contains(&v.voice_id)) {
            return voice.clone();
        }
        if let Some(voice) = catalog_voices.into_iter().next() {
            return voice;
        }
        // Catalog is empty (refresh failed and no cache existed): fall
        // back to the fixed Chirp3-HD backup list, per spec.md §4.4 step 3.
        let backup = chirp3_hd_backup(gender);
        let voice_id = backup
            .iter()
            .find(|id| !used.contains(**id))
            .or_else(|| backup.first())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{gender:?}-fallback-voice"));
        CatalogVoice {
            voice_id,
            language_codes: vec!["en-US".to_string()],
            speaking_rate: 1.0,
            pitch: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use podcast_core::{RawVoice, Result, TtsBackend, TtsRequest};
    use std::time::Duration;

    struct StubTts;

    #[async_trait]
    impl TtsBackend for StubTts {
        async fn synthesize(&self, _request: &TtsRequest) -> Result<String> {
            Ok("stub.mp3".to_string())
        }

        async fn list_voices(&self) -> Result<Vec<RawVoice>> {
            let mut voices = Vec::new();
            for i in 0..4 {
                voices.push(RawVoice {
                    voice_id: format!("en-US-Chirp3-HD-Male{i}"),
                    language_codes: vec!["en-US".to_string()],
                    ssml_gender: "Male".to_string(),
                });
                voices.push(RawVoice {
                    voice_id: format!("en-US-Chirp3-HD-Female{i}"),
                    language_codes: vec!["en-US".to_string()],
                    ssml_gender: "Female".to_string(),
                });
            }
            Ok(voices)
        }
    }

    fn persona(person_id: &str, gender: Option<Gender>) -> PersonaInput {
        PersonaInput {
            person_id: person_id.to_string(),
            name: person_id.to_string(),
            detailed_profile: "profile".to_string(),
            gender,
            source_context: Some("source".to_string()),
        }
    }

    #[tokio::test]
    async fn assigns_distinct_names_and_voices_and_host_last() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = VoiceCatalog::new(dir.path().join("cache.json"), Duration::from_secs(86_400));
        let allocator = PersonaAllocator::new(&catalog);
        let backend = StubTts;

        let result = allocator
            .assign(
                vec![persona("skeptic", Some(Gender::Male)), persona("enthusiast", Some(Gender::Female))],
                None,
                Some(Gender::Neutral),
                &backend,
            )
            .await;
        assert_eq!(result.host.person_id, "Host");
        assert_eq!(result.host.name, "Host");

        let mut names: Vec<&str> =
            result.personas.iter().filter_map(|p| p.invented_name.as_deref()).collect();
        names.push(result.host.invented_name.as_deref().unwrap());
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len(), "expected distinct invented names across guests and host");

        let mut voice_ids: Vec<&str> =
            result.personas.iter().filter_map(|p| p.tts_voice_id.as_deref()).collect();
        voice_ids.push(result.host.tts_voice_id.as_deref().unwrap());
        let unique_voices: HashSet<&str> = voice_ids.iter().copied().collect();
        assert_eq!(unique_voices.len(), voice_ids.len());
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn unspecified_gender_falls_back_to_round_robin() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = VoiceCatalog::new(dir.path().join("cache.json"), Duration::from_secs(86_400));
        let allocator = PersonaAllocator::new(&catalog);
        let backend = StubTts;

        let result = allocator
            .assign(
                vec![persona("a", None), persona("b", None), persona("c", None)],
                None,
                None,
                &backend,
            )
            .await;

        assert_eq!(result.personas[0].gender, Some(Gender::Male));
        assert_eq!(result.personas[1].gender, Some(Gender::Female));
        assert_eq!(result.personas[2].gender, Some(Gender::Neutral));
        assert_eq!(result.host.gender, Some(Gender::Female));
    }

    #[tokio::test]
    async fn host_invented_name_override_is_used_literally() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = VoiceCatalog::new(dir.path().join("cache.json"), Duration::from_secs(86_400));
        let allocator = PersonaAllocator::new(&catalog);
        let backend = StubTts;

        let result = allocator
            .assign(vec![persona("skeptic", Some(Gender::Male))], Some("Brigette"), None, &backend)
            .await;

        assert_eq!(result.host.invented_name.as_deref(), Some("Brigette"));
        assert_eq!(result.host.person_id, "Host");
        assert_eq!(result.host.name, "Host");
    }
}
