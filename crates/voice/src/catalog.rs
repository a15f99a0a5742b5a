//! `VoiceCatalog`: loads, caches, and refreshes the TTS backend's voice
//! inventory, per spec.md §4.5.
//!
//! Grounded on `original_source/app/tts_service.py`'s `_refresh_voice_cache`
//! (lines ~330-421): the exact `(speaking_rate, pitch)` sweep, the
//! Chirp3-HD/Chirp-HD family preference, and the round-robin
//! parameter-cycle cursor. The unsynchronized global cache the original
//! uses is replaced with a `tokio::sync::RwLock` guarding a write-to-temp-
//! then-rename refresh, per spec.md §5 and §9's "global mutable voice
//! cache" re-architecture flag.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use podcast_core::{Gender, RawVoice, Result, TtsBackend};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One voice selected into the catalog, with its assigned `(rate, pitch)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogVoice {
    pub voice_id: String,
    pub language_codes: Vec<String>,
    pub speaking_rate: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VoiceBuckets {
    #[serde(rename = "Male")]
    male: Vec<CatalogVoice>,
    #[serde(rename = "Female")]
    female: Vec<CatalogVoice>,
    #[serde(rename = "Neutral")]
    neutral: Vec<CatalogVoice>,
}

impl VoiceBuckets {
    fn get(&self, gender: Gender) -> &[CatalogVoice] {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
            Gender::Neutral => &self.neutral,
        }
    }
}

/// Versioned on-disk cache schema. `Legacy` reads the pre-existing direct
/// `gender -> Vec<CatalogVoice>` map the original tool wrote before the
/// `last_updated` envelope was added, per spec.md §4.5's backward-compat
/// requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum VoiceCacheFile {
    Versioned {
        last_updated: DateTime<Utc>,
        voices: VoiceBuckets,
    },
    Legacy(VoiceBuckets),
}

/// Target language distribution the refresh tries to satisfy per gender,
/// e.g. `en-US: 36, en-GB: 12, en-AU: 12` from spec.md §4.5.
pub struct LanguageTarget {
    pub language_code: &'static str,
    pub count: usize,
}

pub const DEFAULT_LANGUAGE_TARGETS: &[LanguageTarget] = &[
    LanguageTarget { language_code: "en-US", count: 36 },
    LanguageTarget { language_code: "en-GB", count: 12 },
    LanguageTarget { language_code: "en-AU", count: 12 },
];

/// Backup voices used when a refresh yields fewer usable voices than the
/// persona allocator needs for a gender — spec.md §4.4 step 3.
pub fn chirp3_hd_backup(gender: Gender) -> &'static [&'static str] {
    match gender {
        Gender::Male => &["en-US-Chirp3-HD-Charon", "en-US-Chirp3-HD-Fenrir", "en-US-Chirp3-HD-Puck"],
        Gender::Female => &["en-US-Chirp3-HD-Kore", "en-US-Chirp3-HD-Leda", "en-US-Chirp3-HD-Zephyr"],
        Gender::Neutral => &["en-US-Chirp3-HD-Aoede", "en-US-Chirp3-HD-Orus"],
    }
}

struct CatalogState {
    buckets: VoiceBuckets,
    last_updated: DateTime<Utc>,
}

/// Process-wide voice inventory cache with a configurable TTL. Cheap to
/// clone: internally `Arc<RwLock<...>>`.
#[derive(Clone)]
pub struct VoiceCatalog {
    state: Arc<RwLock<Option<CatalogState>>>,
    cache_path: PathBuf,
    ttl: Duration,
}

impl VoiceCatalog {
    pub fn new(cache_path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(None)),
            cache_path: cache_path.into(),
            ttl,
        }
    }

    /// Returns the cached voice list for `gender`, refreshing first if the
    /// cache is absent, stale, or unreadable. A concurrent reader during a
    /// refresh may observe the previous value (acceptable per spec.md §5);
    /// it will never observe a torn/partial write.
    pub async fn voices_for(&self, gender: Gender, backend: &dyn TtsBackend) -> Vec<CatalogVoice> {
        self.ensure_fresh(backend).await;
        let guard = self.state.read().await;
        guard
            .as_ref()
            .map(|s| s.buckets.get(gender).to_vec())
            .unwrap_or_default()
    }

    async fn ensure_fresh(&self, backend: &dyn TtsBackend) {
        {
            let guard = self.state.read().await;
            if let Some(state) = guard.as_ref() {
                let age = Utc::now().signed_duration_since(state.last_updated);
                if age.to_std().map(|d| d < self.ttl).unwrap_or(false) {
                    return;
                }
            }
        }
        // Try the on-disk cache before hitting the network.
        if let Some(loaded) = self.load_from_disk() {
            let fresh = Utc::now().signed_duration_since(loaded.1).to_std().map(|d| d < self.ttl).unwrap_or(false);
            if fresh {
                let mut guard = self.state.write().await;
                *guard = Some(CatalogState { buckets: loaded.0, last_updated: loaded.1 });
                return;
            }
        }
        if let Err(err) = self.refresh(backend).await {
            tracing::warn!(error = %err, "voice catalog refresh failed; serving stale or empty catalog");
        }
    }

    fn load_from_disk(&self) -> Option<(VoiceBuckets, DateTime<Utc>)> {
        let raw = std::fs::read_to_string(&self.cache_path).ok()?;
        let file: VoiceCacheFile = serde_json::from_str(&raw).ok()?;
        match file {
            VoiceCacheFile::Versioned { last_updated, voices } => Some((voices, last_updated)),
            VoiceCacheFile::Legacy(voices) => Some((voices, DateTime::<Utc>::from(std::time::UNIX_EPOCH))),
        }
    }

    /// Queries the backend, partitions by gender, selects toward the
    /// language distribution target preferring Chirp families, assigns
    /// `(rate, pitch)` round-robin, and persists via write-to-temp-then-
    /// rename.
    pub async fn refresh(&self, backend: &dyn TtsBackend) -> Result<()> {
        let raw = backend.list_voices().await?;
        let buckets = build_buckets(&raw);
        let now = Utc::now();

        {
            let mut guard = self.state.write().await;
            *guard = Some(CatalogState { buckets: buckets.clone(), last_updated: now });
        }

        if let Err(err) = persist_atomically(&self.cache_path, &buckets, now) {
            tracing::warn!(error = %err, path = %self.cache_path.display(), "failed to persist voice catalog cache");
        }
        Ok(())
    }
}

fn build_buckets(raw: &[RawVoice]) -> VoiceBuckets {
    let mut male_raw: Vec<&RawVoice> = raw.iter().filter(|v| v.ssml_gender.eq_ignore_ascii_case("male")).collect();
    let mut female_raw: Vec<&RawVoice> = raw.iter().filter(|v| v.ssml_gender.eq_ignore_ascii_case("female")).collect();

    // Prefer Chirp3-HD/Chirp-HD families, exactly as tts_service.py's
    // sort_voices does with a "not chirp" sort key.
    let chirp_first = |v: &&RawVoice| !(v.voice_id.contains("Chirp3-HD") || v.voice_id.contains("Chirp-HD"));
    male_raw.sort_by_key(|v| (chirp_first(v), v.voice_id.clone()));
    female_raw.sort_by_key(|v| (chirp_first(v), v.voice_id.clone()));

    // DEFAULT_LANGUAGE_TARGETS is the aggregate target spread across all
    // three gender buckets (tts_service.py:342-346's `gender_limits = {k: v
    // // 3 ...}`), not a per-gender target, so each bucket only gets a third
    // of each language count.
    let gender_targets = per_gender_targets(DEFAULT_LANGUAGE_TARGETS);
    let male = select_for_targets(&male_raw, &gender_targets);
    let female = select_for_targets(&female_raw, &gender_targets);

    let speaking_rates: Vec<f32> = (0..11).map(|i| round2(0.85 + i as f32 * 0.03)).collect();
    let male_pitches: Vec<f32> = (0..11).map(|i| round2(-0.6 + i as f32 * 0.12)).collect();
    let female_pitches: Vec<f32> = (0..11).map(|i| round2(-0.2 + i as f32 * 0.12)).collect();
    let neutral_pitches: Vec<f32> = (0..11).map(|i| round2(-0.3 + i as f32 * 0.06)).collect();

    let mut cursor = ParamCursor::new(speaking_rates.clone());
    let male_voices = assign_params(male, &mut cursor, &male_pitches);
    let mut cursor = ParamCursor::new(speaking_rates.clone());
    let female_voices = assign_params(female, &mut cursor, &female_pitches);

    // Neutral bucket draws evenly from the already-selected Male/Female
    // voices, re-pitched from the neutral range, per spec.md §4.5.
    let mut neutral_source: Vec<(String, Vec<String>)> = Vec::new();
    for (i, v) in male_voices.iter().enumerate() {
        if i % 2 == 0 {
            neutral_source.push((v.voice_id.clone(), v.language_codes.clone()));
        }
    }
    for (i, v) in female_voices.iter().enumerate() {
        if i % 2 == 0 {
            neutral_source.push((v.voice_id.clone(), v.language_codes.clone()));
        }
    }
    let mut cursor = ParamCursor::new(speaking_rates);
    let neutral_voices: Vec<CatalogVoice> = neutral_source
        .into_iter()
        .map(|(voice_id, language_codes)| {
            let (rate, pitch) = cursor.next(&neutral_pitches);
            CatalogVoice { voice_id, language_codes, speaking_rate: rate, pitch }
        })
        .collect();

    VoiceBuckets {
        male: male_voices,
        female: female_voices,
        neutral: neutral_voices,
    }
}

/// Divides each aggregate target's count by 3 (one share per gender
/// bucket), matching `tts_service.py`'s `v // 3` integer division.
fn per_gender_targets(targets: &[LanguageTarget]) -> Vec<LanguageTarget> {
    targets.iter().map(|t| LanguageTarget { language_code: t.language_code, count: t.count / 3 }).collect()
}

fn select_for_targets<'a>(sorted: &[&'a RawVoice], targets: &[LanguageTarget]) -> Vec<&'a RawVoice> {
    let mut selected = Vec::new();
    for target in targets {
        let mut taken = 0;
        for voice in sorted {
            if taken >= target.count {
                break;
            }
            let already_selected = selected.iter().any(|v: &&RawVoice| v.voice_id == voice.voice_id);
            if voice.language_codes.iter().any(|c| c == target.language_code) && !already_selected {
                selected.push(*voice);
                taken += 1;
            }
        }
    }
    selected
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Round-robin cursor over `(rate, pitch)` combinations, the idiomatic
/// replacement for the original's `next_params` closure over a mutable
/// index (`tts_service.py:380-390`).
struct ParamCursor {
    rates: Vec<f32>,
    index: usize,
    seen: std::collections::HashSet<(u32, u32)>,
}

impl ParamCursor {
    fn new(rates: Vec<f32>) -> Self {
        Self { rates, index: 0, seen: Default::default() }
    }

    /// Advances through combinations, maximizing distinctness by skipping
    /// combos already handed out this refresh before falling back to the
    /// first pair once every combination has been used once.
    fn next(&mut self, pitches: &[f32]) -> (f32, f32) {
        let total = self.rates.len() * pitches.len();
        for _ in 0..total {
            let rate = self.rates[self.index % self.rates.len()];
            let pitch = pitches[(self.index * 2) % pitches.len()];
            self.index += 1;
            let key = (rate.to_bits(), pitch.to_bits());
            if self.seen.insert(key) {
                return (rate, pitch);
            }
        }
        (self.rates[0], pitches[0])
    }
}

fn assign_params(voices: Vec<&RawVoice>, cursor: &mut ParamCursor, pitches: &[f32]) -> Vec<CatalogVoice> {
    voices
        .into_iter()
        .map(|v| {
            let (rate, pitch) = cursor.next(pitches);
            CatalogVoice {
                voice_id: v.voice_id.clone(),
                language_codes: v.language_codes.clone(),
                speaking_rate: rate,
                pitch,
            }
        })
        .collect()
}

fn persist_atomically(path: &Path, buckets: &VoiceBuckets, now: DateTime<Utc>) -> std::io::Result<()> {
    let file = VoiceCacheFile::Versioned { last_updated: now, voices: buckets.clone() };
    let json = serde_json::to_string_pretty(&file)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use podcast_core::TtsRequest;

    struct StubTts {
        voices: Vec<RawVoice>,
    }

    #[async_trait]
    impl TtsBackend for StubTts {
        async fn synthesize(&self, _request: &TtsRequest) -> Result<String> {
            Ok("stub.mp3".to_string())
        }

        async fn list_voices(&self) -> Result<Vec<RawVoice>> {
            Ok(self.voices.clone())
        }
    }

    fn stub_voices() -> Vec<RawVoice> {
        let mut voices = Vec::new();
        for i in 0..5 {
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
        voices
    }

    #[tokio::test]
    async fn refresh_partitions_by_gender_and_assigns_distinct_params() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        let catalog = VoiceCatalog::new(&cache_path, Duration::from_secs(86_400));
        let backend = StubTts { voices: stub_voices() };

        let males = catalog.voices_for(Gender::Male, &backend).await;
        assert_eq!(males.len(), 5);
        let females = catalog.voices_for(Gender::Female, &backend).await;
        assert_eq!(females.len(), 5);

        let unique_params: std::collections::HashSet<(u32, u32)> = males
            .iter()
            .map(|v| (v.speaking_rate.to_bits(), v.pitch.to_bits()))
            .collect();
        assert_eq!(unique_params.len(), males.len());

        assert!(cache_path.exists());
    }

    #[tokio::test]
    async fn neutral_bucket_draws_from_male_and_female() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        let catalog = VoiceCatalog::new(&cache_path, Duration::from_secs(86_400));
        let backend = StubTts { voices: stub_voices() };

        let neutral = catalog.voices_for(Gender::Neutral, &backend).await;
        assert!(!neutral.is_empty());
    }

    #[test]
    fn legacy_cache_schema_deserializes() {
        let legacy = r#"{"Male": [], "Female": [], "Neutral": []}"#;
        let parsed: VoiceCacheFile = serde_json::from_str(legacy).unwrap();
        assert!(matches!(parsed, VoiceCacheFile::Legacy(_)));
    }
}
