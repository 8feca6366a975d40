//! Best-effort JSON recovery from free-form model text.
//!
//! Models wrap their answer in markdown fences, prepend prose, or echo part
//! of the instructions. `extract_json` picks the most likely JSON object and
//! `sanitize_json` scrubs what is left before decoding.

use regex::Regex;

lazy_static::lazy_static! {
    static ref FENCED_BLOCK: Regex = Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap();
}

/// Marker that only appears in the instruction text, never in a real answer.
const INSTRUCTIONS_MARKER: &str = "JSON SCHEMA";

/// Finds the JSON payload in a model response.
///
/// Tried in order: the body of the first fenced code block, the span from
/// the first `{` to the last `}` unless it looks like echoed instructions,
/// and finally the whole response. Returns `None` only for blank input.
pub fn extract_json(text: &str) -> Option<String> {
    if let Some(body) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        let body = body.as_str().trim();
        if !body.is_empty() {
            return Some(body.to_string());
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            let candidate = &text[start..=end];
            if !candidate.contains(INSTRUCTIONS_MARKER) {
                return Some(candidate.to_string());
            }
        }
    }

    let whole = text.trim();
    if whole.is_empty() {
        None
    } else {
        Some(whole.to_string())
    }
}

/// Removes stray fence markers, surrounding whitespace and one leading
/// backslash left over from escaped output.
pub fn sanitize_json(candidate: &str) -> String {
    let cleaned = candidate.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    cleaned.strip_prefix('\\').unwrap_or(cleaned).to_string()
}
