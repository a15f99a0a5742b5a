//! Free-form duration parsing, grounded on
//! `original_source/app/llm_service.py`'s duration parser: a leading
//! number followed by an hour/second/minute unit word, minutes assumed
//! when no unit matches. Falls back to 300 seconds (with a warning) on
//! anything unparseable.

use once_cell::sync::Lazy;
use regex::Regex;

const FALLBACK_SECONDS: u32 = 300;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static HOUR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)hour|hr").unwrap());
static SECOND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)sec").unwrap());

/// Returns the parsed duration in seconds, and a warning message when the
/// input could not be parsed and the 300s default was used instead.
pub fn parse_duration(raw: &str) -> (u32, Option<String>) {
    let trimmed = raw.trim();
    let Some(m) = NUMBER_RE.find(trimmed) else {
        return (
            FALLBACK_SECONDS,
            Some(format!("could not parse duration '{raw}'; using default of {FALLBACK_SECONDS} seconds")),
        );
    };
    let Ok(value) = m.as_str().parse::<f64>() else {
        return (
            FALLBACK_SECONDS,
            Some(format!("could not parse duration '{raw}'; using default of {FALLBACK_SECONDS} seconds")),
        );
    };

    let seconds = if HOUR_RE.is_match(trimmed) {
        value * 3600.0
    } else if SECOND_RE.is_match(trimmed) {
        value
    } else {
        value * 60.0
    };

    (seconds.round() as u32, None)
}
