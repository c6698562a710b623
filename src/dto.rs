//! Tolerant decoding of backend payloads.
//!
//! The backend mixes snake_case and camelCase and sometimes wraps payloads.
//! Each decoder documents its field priority and never fails: missing or
//! mistyped fields fall back to empty values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /ai/summary/{surveyId}` and the latest-analysis endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub ok: bool,
    pub summary: String,
    pub count: u64,
    pub error: Option<String>,
}

impl SummaryResponse {
    /// Nothing to normalize: a failed call or a blank summary.
    pub fn is_empty(&self) -> bool {
        !self.ok || self.summary.trim().is_empty()
    }
}

/// Field priority:
/// - `ok`: `ok` › `success` (bool, or the strings "true"/"false")
/// - `summary`: `summary` › `summary_text` › `summaryText` › `text`
/// - `count`: `count` › `response_count` › `responseCount` › `total`
/// - `error`: `error` › `message`
pub fn decode_summary(value: &Value) -> SummaryResponse {
    SummaryResponse {
        ok: first_bool(value, &["ok", "success"]).unwrap_or(false),
        summary: first_str(value, &["summary", "summary_text", "summaryText", "text"])
            .unwrap_or_default(),
        count: first_u64(value, &["count", "response_count", "responseCount", "total"]).unwrap_or(0),
        error: first_str(value, &["error", "message"]),
    }
}

/// Unwraps `data` › `result` › top level, then decodes as a summary.
pub fn decode_latest_analysis(value: &Value) -> SummaryResponse {
    let inner = ["data", "result"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find(|v| v.is_object())
        .unwrap_or(value);

    let mut decoded = decode_summary(inner);
    // The envelope may carry `ok` while the payload does not.
    if !decoded.ok && !std::ptr::eq(inner, value) {
        decoded.ok = first_bool(value, &["ok", "success"]).unwrap_or(false);
    }
    decoded
}

/// Number of responses for a survey.
///
/// A bare array counts its elements. A page object uses `totalElements` ›
/// `total_elements` › `total` › `count`, then the length of `content` ›
/// `responses` › `data`.
pub fn decode_response_count(value: &Value) -> u64 {
    if let Some(items) = value.as_array() {
        return items.len() as u64;
    }
    if let Some(total) = first_u64(value, &["totalElements", "total_elements", "total", "count"]) {
        return total;
    }
    ["content", "responses", "data"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .map_or(0, |items| items.len() as u64)
}

fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn first_u64(value: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn first_bool(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
