//! Single lenient parser for LLM structured output, replacing the original
//! dynamic dict-shaped JSON cleaning with one typed entry point, per
//! spec.md §9.
//!
//! Grounded on `original_source/app/llm_service.py::_clean_json_string_from_markdown`:
//! strip a markdown code fence if present, then try to recover a balanced
//! JSON value even from a response with leading/trailing prose around it.

use serde::de::DeserializeOwned;

use crate::error::LlmError;

/// Outcome of [`parse_structured`]: either a clean parse, or a value
/// recovered after stripping markdown/prose, which the caller should
/// surface as a warning rather than silently accept.
pub struct ParseOutcome<T> {
    pub value: T,
    pub recovered: bool,
}

/// Parses `raw` as `T`, tolerating markdown code fences and leading/
/// trailing prose around the JSON payload.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<ParseOutcome<T>, LlmError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LlmError::InvalidResponse("empty LLM response".to_string()));
    }

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(ParseOutcome { value, recovered: false });
    }

    let fenced = strip_code_fence(trimmed);
    if fenced != trimmed {
        if let Ok(value) = serde_json::from_str::<T>(&fenced) {
            return Ok(ParseOutcome { value, recovered: true });
        }
    }

    let candidate = fenced.as_str();
    if let Some(balanced) = extract_balanced(candidate, '{', '}').or_else(|| extract_balanced(candidate, '[', ']')) {
        if let Ok(value) = serde_json::from_str::<T>(&balanced) {
            return Ok(ParseOutcome { value, recovered: true });
        }
    }

    Err(LlmError::InvalidResponse(format!(
        "could not recover a valid JSON structure from response (first 200 chars): {}",
        &trimmed.chars().take(200).collect::<String>()
    )))
}

/// Strips a leading ```json / ``` fence and trailing ``` if present.
fn strip_code_fence(text: &str) -> String {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text.to_string();
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\n', '\r']);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim().to_string(),
        None => rest.trim().to_string(),
    }
}

/// Extracts the first balanced `open`/`close` delimited substring,
/// tolerating nested delimiters and quoted strings containing them.
fn extract_balanced(text: &str, open: char, close: char) -> Option<String> {
    let start = text.find(open)?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn parses_clean_json_without_recovery() {
        let outcome = parse_structured::<Sample>(r#"{"name": "a", "count": 3}"#).unwrap();
        assert_eq!(outcome.value, Sample { name: "a".to_string(), count: 3 });
        assert!(!outcome.recovered);
    }

    #[test]
    fn strips_markdown_fence() {
        let raw = "```json\n{\"name\": \"b\", \"count\": 7}\n```";
        let outcome = parse_structured::<Sample>(raw).unwrap();
        assert_eq!(outcome.value.name, "b");
        assert!(outcome.recovered);
    }

    #[test]
    fn recovers_balanced_object_from_surrounding_prose() {
        let raw = "Sure, here you go: {\"name\": \"c\", \"count\": 1} Let me know if you need more.";
        let outcome = parse_structured::<Sample>(raw).unwrap();
        assert_eq!(outcome.value.count, 1);
        assert!(outcome.recovered);
    }

    #[test]
    fn fails_on_unrecoverable_garbage() {
        let result = parse_structured::<Sample>("not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn nested_braces_do_not_truncate_early() {
        let raw = r#"{"name": "{nested}", "count": 2}"#;
        let outcome = parse_structured::<Sample>(raw).unwrap();
        assert_eq!(outcome.value.name, "{nested}");
    }
}
