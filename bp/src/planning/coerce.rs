//! Recover a structured breakdown from raw completion text
//!
//! The model is told to answer with bare JSON followed by a question, but
//! replies arrive wrapped in prose, fenced in markdown or keyed
//! inconsistently. Decoding is attempted on the whole text first, then on
//! balanced `{...}` spans in order of appearance.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::breakdown::{Breakdown, BreakdownStep};

/// Keys the step list may appear under, in priority order
pub const STEP_LIST_KEYS: [&str; 3] = ["steps", "briefs", "Briefs"];

/// Raw text held no decodable structured payload
#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("No structured payload found in completion ({len} chars)")]
    NoStructuredPayload { len: usize },

    #[error("Structured payload has an unusable shape: {0}")]
    InvalidShape(String),
}

/// Decode `raw` into a breakdown, tolerating surrounding text and key variance
///
/// A payload without a usable step list decodes to a breakdown with zero
/// steps; callers decide how to surface that.
pub fn coerce(raw: &str) -> Result<Breakdown, CoercionError> {
    debug!(raw_len = raw.len(), "coerce: called");
    let object = decode_object(raw).ok_or(CoercionError::NoStructuredPayload { len: raw.len() })?;
    normalize(object)
}

fn decode_object(raw: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(raw.trim()) {
        debug!("decode_object: direct decode succeeded");
        return Some(obj);
    }

    let mut from = 0;
    while let Some((start, end)) = balanced_span(raw, from) {
        let candidate = &raw[start..end];
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(obj)) => {
                debug!(start, end, "decode_object: extracted embedded object");
                return Some(obj);
            }
            _ => {
                debug!(start, end, "decode_object: span did not decode, continuing after it");
                from = end;
            }
        }
    }

    None
}

/// Byte range of the first balanced `{...}` starting at or after `from`
///
/// Braces inside JSON string literals are ignored. A `{` that never closes
/// does not end the search; the scan resumes at the next `{`.
fn balanced_span(text: &str, from: usize) -> Option<(usize, usize)> {
    let mut start = from + text.get(from..)?.find('{')?;
    loop {
        if let Some(end) = closing_brace(&text[start..]) {
            return Some((start, start + end));
        }
        start = start + 1 + text[start + 1..].find('{')?;
    }
}

/// Offset just past the `}` matching the `{` that opens `text`
fn closing_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
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
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn normalize(mut object: Map<String, Value>) -> Result<Breakdown, CoercionError> {
    // Remove every alias so none leaks into the extra keys; the first non-null wins.
    let mut step_list = None;
    for key in STEP_LIST_KEYS {
        if let Some(value) = object.remove(key)
            && step_list.is_none()
            && !value.is_null()
        {
            step_list = Some(value);
        }
    }

    let steps = match step_list {
        Some(Value::Array(items)) => decode_steps(items),
        Some(other) => {
            warn!(kind = %value_kind(&other), "normalize: step list is not an array, treating as empty");
            Vec::new()
        }
        None => {
            warn!("normalize: no step list key present, treating as empty");
            Vec::new()
        }
    };

    let mut breakdown: Breakdown =
        serde_json::from_value(Value::Object(object)).map_err(|e| CoercionError::InvalidShape(e.to_string()))?;
    breakdown.steps = steps;
    Ok(breakdown)
}

fn decode_steps(items: Vec<Value>) -> Vec<BreakdownStep> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<BreakdownStep>(item) {
            Ok(step) => Some(step),
            Err(e) => {
                warn!(idx, error = %e, "decode_steps: dropping undecodable step");
                None
            }
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
