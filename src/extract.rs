//! Locates the JSON object embedded in a model reply
//!
//! Replies may wrap the payload in code fences or surround it with prose. Fence
//! lines are stripped, then a string-aware balanced-brace scan yields candidate
//! object spans. A candidate carrying one of the assessment's top-level keys
//! wins; otherwise the first complete top-level object is the payload.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{AuditError, Result};

/// Keys that mark an object as the assessment payload rather than an echoed example
const PAYLOAD_KEYS: [&str; 3] = ["scores", "findings", "overall_score"];

// JSON strings cannot hold a raw newline, so a fence at line start is never
// inside a string value.
static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_-]*[ \t]*").expect("fence regex is valid")
});

/// Remove markdown code-fence markers that open a line, keeping their contents
pub fn strip_code_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").into_owned()
}

/// A balanced `{...}` span found by [`json_object_spans`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectSpan<'a> {
    pub text: &'a str,
    /// Found after rescanning past an opening brace that never closed
    pub enclosed: bool,
}

/// Balanced `{...}` spans of `text`, in order of appearance
///
/// Quotes only open strings inside an object, so stray quotes in surrounding
/// prose do not derail the scan. When an opening brace never closes, the scan
/// resumes just after it, so a stray `{` in a preamble cannot hide the payload
/// that follows. Spans found that way are marked `enclosed`.
pub fn json_object_spans(text: &str) -> Vec<ObjectSpan<'_>> {
    let mut spans = Vec::new();
    let mut offset = 0;
    let mut enclosed = false;

    loop {
        let pass = scan_balanced(&text[offset..]);
        spans.extend(pass.closed.into_iter().map(|(from, to)| ObjectSpan {
            text: &text[offset + from..offset + to],
            enclosed,
        }));
        match pass.unclosed {
            // `{` is one byte, so the next offset is a char boundary
            Some(open) => {
                offset += open + 1;
                enclosed = true;
            }
            None => break,
        }
    }

    spans
}

struct ScanPass {
    closed: Vec<(usize, usize)>,
    unclosed: Option<usize>,
}

fn scan_balanced(text: &str) -> ScanPass {
    let mut closed = Vec::new();
    let mut depth: u32 = 0;
    let mut open_at = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    open_at = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    closed.push((open_at, idx + 1));
                }
            }
            _ => {}
        }
    }

    ScanPass {
        closed,
        unclosed: (depth > 0).then_some(open_at),
    }
}

fn has_payload_key(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| PAYLOAD_KEYS.iter().any(|key| map.contains_key(*key)))
}

/// Extract and parse the JSON object payload of a raw reply
pub fn extract_payload(raw: &str) -> Result<Value> {
    let cleaned = strip_code_fences(raw);

    if !cleaned.contains('{') {
        return Err(AuditError::NoJsonFound);
    }

    let spans = json_object_spans(&cleaned);
    let mut fallback: Option<Value> = None;
    let mut first_error: Option<serde_json::Error> = None;

    for span in &spans {
        match serde_json::from_str::<Value>(span.text) {
            Ok(value) if has_payload_key(&value) => return Ok(value),
            // Objects nested in a cut-off reply are fragments, never the payload
            Ok(value @ Value::Object(_)) if !span.enclosed => {
                fallback.get_or_insert(value);
            }
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(value) = fallback {
        return Ok(value);
    }

    let unterminated = spans.is_empty() || spans.iter().any(|s| s.enclosed);
    let message = match first_error {
        Some(e) => e.to_string(),
        None if unterminated => "unterminated JSON object".to_string(),
        None => "no span parsed as a JSON object".to_string(),
    };
    Err(AuditError::MalformedJson { message })
}

/// Truncate to `max` chars for log context
pub fn snippet(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn texts<'a>(spans: &[ObjectSpan<'a>]) -> Vec<&'a str> {
        spans.iter().map(|s| s.text).collect()
    }

    #[test]
    fn fenced_reply_with_preamble() {
        let raw = "Sure! ```json\n{\"scores\":{\"sort\":70},\"findings\":{},\"overall_score\":72}\n```";
        let value = extract_payload(raw).unwrap();
        assert_eq!(
            value,
            json!({"scores": {"sort": 70}, "findings": {}, "overall_score": 72})
        );
    }

    #[test]
    fn trailing_prose_with_braces_does_not_extend_span() {
        let raw = r#"{"overall_score": 61, "summary": "ok"}

Note: scores use the {0-100} scale and "strings" in prose are fine."#;
        let spans = json_object_spans(raw);
        assert_eq!(spans[0].text, r#"{"overall_score": 61, "summary": "ok"}"#);
        assert!(!spans[0].enclosed);
        let value = extract_payload(raw).unwrap();
        assert_eq!(value["overall_score"], 61);
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let raw = r#"{"summary": "uses } and { in \"text\"", "n": 1}"#;
        let spans = json_object_spans(raw);
        assert_eq!(texts(&spans), vec![raw]);
    }

    #[test]
    fn stray_quote_in_preamble_is_harmless() {
        let raw = r#"Here's the "audit: {"overall_score": 40}"#;
        let value = extract_payload(raw).unwrap();
        assert_eq!(value, json!({"overall_score": 40}));
    }

    #[test]
    fn skips_non_json_brace_span_before_payload() {
        let raw = r#"Scores are {integers}. {"overall_score": 80}"#;
        let value = extract_payload(raw).unwrap();
        assert_eq!(value, json!({"overall_score": 80}));
    }

    #[test]
    fn unclosed_brace_in_preamble_does_not_hide_payload() {
        let raw = "Assessment {see below:\n```json\n{\"scores\":{},\"findings\":{},\"overall_score\":70}\n```";
        let spans = json_object_spans(raw);
        assert!(spans.iter().all(|s| s.enclosed));
        let value = extract_payload(raw).unwrap();
        assert_eq!(
            value,
            json!({"scores": {}, "findings": {}, "overall_score": 70})
        );
    }

    #[test]
    fn echoed_example_object_loses_to_payload() {
        let raw = "Each finding looks like {\"severity\": \"minor\"}.\n{\"scores\":{},\"findings\":{},\"overall_score\":70}";
        let value = extract_payload(raw).unwrap();
        assert_eq!(value["overall_score"], 70);
        assert!(value.get("severity").is_none());
    }

    #[test]
    fn first_object_is_used_when_none_carries_payload_keys() {
        let raw = r#"{"summary": "partial"} then {"other": 1}"#;
        assert_eq!(extract_payload(raw).unwrap(), json!({"summary": "partial"}));
    }

    #[test]
    fn fence_inside_string_value_is_kept() {
        let raw = "```json\n{\"overall_score\": 50, \"summary\": \"label reads ```json here\"}\n```";
        let value = extract_payload(raw).unwrap();
        assert_eq!(value["summary"], "label reads ```json here");
    }

    #[test]
    fn indented_fence_lines_are_stripped() {
        assert_eq!(strip_code_fences("  ```json\n{}\n  ```\n"), "\n{}\n\n");
    }

    #[test]
    fn no_braces_is_no_json_found() {
        let err = extract_payload("I cannot analyze these images.").unwrap_err();
        assert!(matches!(err, AuditError::NoJsonFound));
        assert!(matches!(extract_payload("").unwrap_err(), AuditError::NoJsonFound));
    }

    #[test]
    fn truncated_object_is_malformed() {
        let err = extract_payload(r#"{"scores": {"sort": 70"#).unwrap_err();
        match err {
            AuditError::MalformedJson { message } => {
                assert_eq!(message, "unterminated JSON object");
            }
            other => panic!("expected malformed json, got {other:?}"),
        }
    }

    #[test]
    fn nested_fragments_of_truncated_reply_are_not_the_payload() {
        let raw = r#"{"scores": {"sort": 70, "shine": 40}, "findings": {"sort": ["#;
        let err = extract_payload(raw).unwrap_err();
        match err {
            AuditError::MalformedJson { message } => {
                assert_eq!(message, "unterminated JSON object");
            }
            other => panic!("expected malformed json, got {other:?}"),
        }
    }

    #[test]
    fn invalid_span_is_malformed() {
        let err = extract_payload("{scores: 70,}").unwrap_err();
        assert!(matches!(err, AuditError::MalformedJson { .. }));
    }

    #[test]
    fn bare_fence_without_language() {
        let raw = "```\n{\"overall_score\": 55}\n```\n";
        assert_eq!(extract_payload(raw).unwrap(), json!({"overall_score": 55}));
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        assert_eq!(snippet("héllo", 2), "hé...");
        assert_eq!(snippet("hi", 5), "hi");
        assert_eq!(snippet("abc", 3), "abc");
    }
}
