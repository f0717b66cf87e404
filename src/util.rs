//! Small helpers - dotted-path value access and the explicit event selector.

use crate::channel::{SinkValue, Sources, StateValue};
use crate::error::ComposeError;
use crate::stream::EventStream;

// =============================================================================
// Dotted-Path Value Access
// =============================================================================

/// Read a dotted path (`"a.b.0"`) out of a dynamic value. Returns `None`
/// when any step is missing. An empty path returns the value itself.
pub fn value_at_path(value: &StateValue, path: &str) -> Option<StateValue> {
    if path.is_empty() {
        return Some(value.clone());
    }
    let mut node = value;
    for seg in path.split('.') {
        node = match node {
            StateValue::Object(map) => map.get(seg)?,
            StateValue::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node.clone())
}

/// Write a dotted path into a dynamic value, creating intermediate objects
/// as needed. Returns the new value; the input is not mutated.
pub fn set_at_path(value: &StateValue, path: &str, inner: StateValue) -> StateValue {
    fn set_segments(value: &StateValue, segments: &[&str], inner: StateValue) -> StateValue {
        let Some((head, rest)) = segments.split_first() else {
            return inner;
        };
        if let Ok(index) = head.parse::<usize>() {
            if let StateValue::Array(items) = value {
                let mut items = items.clone();
                if index < items.len() {
                    items[index] = set_segments(&items[index], rest, inner);
                    return StateValue::Array(items);
                }
            }
        }
        let mut map = match value {
            StateValue::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        let child = map.get(*head).cloned().unwrap_or(StateValue::Null);
        map.insert((*head).to_string(), set_segments(&child, rest, inner));
        StateValue::Object(map)
    }

    if path.is_empty() {
        return inner;
    }
    let segments: Vec<&str> = path.split('.').collect();
    set_segments(value, &segments, inner)
}

// =============================================================================
// Event Selector
// =============================================================================

/// Read a payload sub-path off a named input channel.
///
/// This is the explicit replacement for path-based accessor sugar: instead
/// of dynamic interception, the caller names the channel and the payload
/// path up front. Emissions whose payload is not a plain value, or where
/// the path is missing, are skipped.
///
/// # Example
///
/// ```ignore
/// // Every `target.value` carried by the "input" channel:
/// let values = select_event(&sources, "input", "target.value")?;
/// ```
pub fn select_event(
    sources: &Sources,
    channel: &str,
    payload_path: &str,
) -> Result<EventStream<StateValue>, ComposeError> {
    let stream = sources
        .channel(channel)
        .ok_or_else(|| ComposeError::MissingChannel(channel.to_string()))?;
    let path = payload_path.to_string();
    Ok(stream.filter_map(move |payload| match payload {
        SinkValue::Value(value) => value_at_path(value, &path),
        _ => None,
    }))
}

// =============================================================================
// Tests
// =============================================================================
