//! Recovery of a JSON object from free-form model output.
//!
//! Models often wrap their JSON in prose or markdown fences. Candidates are
//! tried in order: a ```json fence, any fence, then the span from the first
//! `{` to the last `}`.

use crate::error::RepairError;
use serde_json::Value;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";
const PREVIEW_CHARS: usize = 200;

/// Extract the first candidate that parses to a JSON object.
pub fn extract_json(raw: &str) -> Result<Value, RepairError> {
    let candidates = [json_fence(raw), generic_fence(raw), brace_span(raw)];

    let mut first_error: Option<serde_json::Error> = None;
    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str::<Value>(candidate.trim()) {
            Ok(value) if value.is_object() => return Ok(value),
            Ok(_) => {
                first_error.get_or_insert_with(not_an_object);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    let source = match first_error {
        Some(e) => e,
        None => serde_json::from_str::<Value>(raw.trim())
            .err()
            .unwrap_or_else(not_an_object),
    };

    Err(RepairError::MalformedResponse {
        source,
        preview: preview(raw),
    })
}

/// Content after the first ```json marker, up to the next fence
fn json_fence(raw: &str) -> Option<&str> {
    let start = raw.find(JSON_FENCE)? + JSON_FENCE.len();
    Some(until_fence(&raw[start..]))
}

/// Content of the first fence of any kind, skipping an info string such as `python`
fn generic_fence(raw: &str) -> Option<&str> {
    let start = raw.find(FENCE)? + FENCE.len();
    let mut body = &raw[start..];

    if let Some(newline) = body.find('\n') {
        let info = &body[..newline];
        if !info.contains('{') && !info.contains('[') {
            body = &body[newline + 1..];
        }
    }
    Some(until_fence(body))
}

fn until_fence(body: &str) -> &str {
    match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    }
}

/// First `{` through last `}`, inclusive
fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn not_an_object() -> serde_json::Error {
    <serde_json::Error as serde::de::Error>::custom("response does not contain a JSON object")
}

fn preview(raw: &str) -> String {
    if raw.chars().count() > PREVIEW_CHARS {
        let truncated: String = raw.chars().take(PREVIEW_CHARS).collect();
        format!("{truncated}...")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_fence_wrapped_in_prose() {
        let raw = "Here is the result:\n```json\n{\"a\":1}\n```\nThanks";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_generic_fence_with_info_string() {
        let raw = "Result below\n```text\n{\"summary\": \"ok\"}\n```";
        assert_eq!(extract_json(raw).unwrap(), json!({"summary": "ok"}));

        let bare = "```\n{\"b\": [1, 2]}\n```";
        assert_eq!(extract_json(bare).unwrap(), json!({"b": [1, 2]}));
    }

    #[test]
    fn test_unclosed_fence_reads_to_end() {
        let raw = "```json\n{\"a\": true}";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": true}));
    }

    #[test]
    fn test_brace_span_in_prose() {
        let raw = "Sure! {\"summary\": \"two idle VMs\"} Let me know.";
        assert_eq!(extract_json(raw).unwrap(), json!({"summary": "two idle VMs"}));
    }

    #[test]
    fn test_brace_span_that_is_not_json_is_malformed() {
        let raw = "noise{\"a\":1}moretext{\"b\":2}";
        let err = extract_json(raw).unwrap_err();
        let RepairError::MalformedResponse { preview, .. } = err;
        assert_eq!(preview, raw);
    }

    #[test]
    fn test_invalid_fence_falls_through_to_braces() {
        let raw = "```json\nnot json at all\n```\nfallback: {\"a\": 2}";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        assert!(extract_json("```json\n[1, 2, 3]\n```").is_err());
        assert!(extract_json("42").is_err());
    }

    #[test]
    fn test_no_json_at_all() {
        let err = extract_json("I could not analyze this data.").unwrap_err();
        assert!(err.to_string().starts_with("Malformed model response"));
    }

    #[test]
    fn test_preview_is_truncated() {
        let raw = "x".repeat(500);
        let RepairError::MalformedResponse { preview, .. } = extract_json(&raw).unwrap_err();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }
}
