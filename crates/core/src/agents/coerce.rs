//! Field coercion for untrusted model payloads.
//!
//! Model output is shaped like the requested schema only most of the time.
//! Every sub-field an agent stores goes through one of these helpers so a
//! wrong type degrades to a default instead of failing the agent.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::state::{QuizKind, QuizQuestion};

/// Unwrap `{"<key>": inner}` envelopes; otherwise return the value itself.
pub fn envelope<'a>(value: &'a Value, key: &str) -> &'a Value {
    match value.get(key) {
        Some(inner) if !inner.is_null() => inner,
        _ => value,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// String at `key`; numbers and booleans are stringified.
pub fn string(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(as_text)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn optional_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(as_text)
        .filter(|s| !s.trim().is_empty())
}

/// Number at `key`; numeric strings are parsed.
pub fn number(value: &Value, key: &str, default: f64) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Number at `key` clamped to `[min, max]`.
pub fn bounded(value: &Value, key: &str, default: f64, min: f64, max: f64) -> f64 {
    let n = number(value, key, default);
    if n.is_finite() {
        n.clamp(min, max)
    } else {
        default
    }
}

/// Non-negative whole number at `key`, rounded.
pub fn whole(value: &Value, key: &str, default: u32) -> u32 {
    let n = number(value, key, f64::from(default));
    if n.is_finite() && n >= 0.0 {
        n.round().min(f64::from(u32::MAX)) as u32
    } else {
        default
    }
}

pub fn boolean(value: &Value, key: &str, default: bool) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => default,
    }
}

/// List of strings at `key`. A bare string becomes a one-element list;
/// anything else is an empty list.
pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(as_text)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Objects of the array at `key`.
pub fn objects<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|item| item.is_object())
}

/// A whitelisted enum at `key`; unknown or missing values map to `default`.
pub fn variant<T: DeserializeOwned>(value: &Value, key: &str, default: T) -> T {
    match value.get(key) {
        Some(Value::String(s)) => {
            serde_json::from_value(Value::String(s.trim().to_lowercase())).unwrap_or(default)
        }
        _ => default,
    }
}

/// One quiz question; `None` when it has no question text.
pub fn quiz_question(value: &Value) -> Option<QuizQuestion> {
    let question = optional_string(value, "question")?;
    Some(QuizQuestion {
        question,
        options: string_list(value, "options"),
        answer: string(value, "answer", ""),
        explanation: string(value, "explanation", ""),
        kind: variant(value, "type", QuizKind::Mcq),
    })
}

pub fn quiz(value: &Value, key: &str) -> Vec<QuizQuestion> {
    objects(value, key).filter_map(quiz_question).collect()
}
