//! Structured-payload extraction from raw model text.
//!
//! Models wrap JSON in prose, reasoning text or markdown fences. Extraction
//! tries, in order:
//!
//! 1. the contents of the first fenced code block (```` ```json ```` or bare ```` ``` ````)
//! 2. the substring from the first `{` to the last `}`
//! 3. the whole text with fence markers stripped

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)\s*```").ok())
        .as_ref()
}

/// Contents of the first fenced block, if any.
pub fn fenced_block(raw: &str) -> Option<&str> {
    fence_pattern()?
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Substring from the first opening brace to the last closing brace.
pub fn brace_span(raw: &str) -> Option<&str> {
    let first = raw.find('{')?;
    let last = raw.rfind('}')?;
    (last > first).then(|| &raw[first..=last])
}

fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Extract a structured payload, or `None` when all three stages fail.
pub fn extract_structured(raw: &str) -> Option<Value> {
    if let Some(block) = fenced_block(raw) {
        if let Ok(value) = serde_json::from_str(block) {
            return Some(value);
        }
    }

    if let Some(span) = brace_span(raw) {
        if let Ok(value) = serde_json::from_str(span) {
            return Some(value);
        }
    }

    serde_json::from_str(&strip_fences(raw)).ok()
}
