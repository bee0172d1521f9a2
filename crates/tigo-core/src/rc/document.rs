//! Dotted-path access into a nested config document.
//!
//! Paths are split on `.`; a literal dot cannot appear inside a segment.
//! Only mappings are walked: an array or scalar in the middle of a path is
//! treated as a dead end.

use crate::error::{Result, TigoError};
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;

static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();

fn numeric_re() -> &'static Regex {
    NUMERIC_RE.get_or_init(|| Regex::new(r"^[+-]?\d+(\.\d*)?$").unwrap())
}

fn segments(path: &str) -> Option<Vec<&str>> {
    if path.is_empty() {
        return None;
    }
    let segs: Vec<&str> = path.split('.').collect();
    if segs.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segs)
}

/// Turn command-line text into a typed value.
///
/// Numeric text becomes a number (integral values stay integers), exactly
/// `true`/`false` become booleans, anything else is kept as a string.
pub fn coerce_value(raw: &str) -> Value {
    if numeric_re().is_match(raw) {
        if let Ok(f) = raw.parse::<f64>() {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                return Value::Number(Number::from(f as i64));
            }
            if let Some(n) = Number::from_f64(f) {
                return Value::Number(n);
            }
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Resolve `path` and return the value it points at.
pub fn get<'a>(doc: &'a Value, path: &str) -> Result<&'a Value> {
    let segs = segments(path).ok_or_else(|| TigoError::KeyNotFound(path.to_string()))?;
    let mut current = doc;
    for seg in segs {
        current = current
            .as_object()
            .and_then(|m| m.get(seg))
            .ok_or_else(|| TigoError::KeyNotFound(path.to_string()))?;
    }
    Ok(current)
}

/// Assign the coerced `raw` value at `path`, creating missing intermediate
/// mappings along the way.
pub fn set(doc: &mut Value, path: &str, raw: &str) -> Result<()> {
    set_value(doc, path, coerce_value(raw))
}

/// Like [`set`] but with an already-typed value.
pub fn set_value(doc: &mut Value, path: &str, value: Value) -> Result<()> {
    let segs = segments(path).ok_or_else(|| TigoError::InvalidKey(path.to_string()))?;
    let (last, parents) = segs
        .split_last()
        .ok_or_else(|| TigoError::InvalidKey(path.to_string()))?;

    if doc.is_null() {
        *doc = Value::Object(Map::new());
    }
    let mut current = doc;
    for (i, seg) in parents.iter().enumerate() {
        let map = current
            .as_object_mut()
            .ok_or_else(|| TigoError::NotAMapping(segs[..i].join(".")))?;
        let entry = map
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        current = entry;
    }

    let map = current
        .as_object_mut()
        .ok_or_else(|| TigoError::NotAMapping(parents.join(".")))?;
    map.insert(last.to_string(), value);
    Ok(())
}

/// Delete the key at `path` and return what it held. Empty parent mappings
/// are left in place.
pub fn remove(doc: &mut Value, path: &str) -> Result<Value> {
    let not_found = || TigoError::KeyNotFound(path.to_string());
    let segs = segments(path).ok_or_else(not_found)?;
    let (last, parents) = segs.split_last().ok_or_else(not_found)?;

    let mut current = doc;
    for seg in parents {
        current = current
            .as_object_mut()
            .and_then(|m| m.get_mut(*seg))
            .ok_or_else(not_found)?;
    }
    current
        .as_object_mut()
        .and_then(|m| m.shift_remove(*last))
        .ok_or_else(not_found)
}

/// Render a value the way `rc get` shows it: strings bare, everything else
/// as pretty JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
