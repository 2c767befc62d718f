use crate::models::{DisplayBounds, PersistedState, WindowBounds};
use serde_json::Value;

pub fn is_valid_bounds(wb: &WindowBounds) -> bool {
    wb.x.is_some() && wb.y.is_some() && wb.width > 0 && wb.height > 0
}

pub fn is_valid_record(state: &PersistedState) -> bool {
    is_valid_bounds(&state.window_bounds) || state.is_maximized || state.is_full_screen
}

fn int_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<i32> {
    obj.get(key)?.as_i64().and_then(|v| i32::try_from(v).ok())
}

/// Returns `None` unless width/height are integers and x/y are integers or `null`.
///
/// Floats such as `100.5` are rejected rather than truncated.
pub fn parse_window_bounds(value: &Value) -> Option<WindowBounds> {
    let obj = value.as_object()?;
    let position = |key: &str| -> Option<Option<i32>> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(_) => int_field(obj, key).map(Some),
        }
    };
    Some(WindowBounds {
        width: int_field(obj, "width")?,
        height: int_field(obj, "height")?,
        x: position("x")?,
        y: position("y")?,
    })
}

fn parse_display_bounds(value: Option<&Value>) -> DisplayBounds {
    let Some(obj) = value.and_then(Value::as_object) else {
        return DisplayBounds::default();
    };
    DisplayBounds {
        width: int_field(obj, "width").unwrap_or(0),
        height: int_field(obj, "height").unwrap_or(0),
        x: int_field(obj, "x").unwrap_or(0),
        y: int_field(obj, "y").unwrap_or(0),
    }
}

/// Decodes a stored record, returning `None` when it is unparsable or fails `is_valid_record`.
///
/// A record that is only valid through its maximized/full-screen flag keeps its flags; garbled
/// window bounds are then replaced by an unplaced `fallback_width × fallback_height`.
pub fn decode_record(bytes: &[u8], fallback_width: i32, fallback_height: i32) -> Option<PersistedState> {
    let raw: Value = serde_json::from_slice(bytes).ok()?;
    let obj = raw.as_object()?;

    let flag = |key: &str| obj.get(key).and_then(Value::as_bool).unwrap_or(false);
    let is_maximized = flag("isMaximized");
    let is_full_screen = flag("isFullScreen");

    let parsed_bounds = obj.get("windowBounds").and_then(parse_window_bounds);
    let bounds_ok = parsed_bounds.as_ref().is_some_and(is_valid_bounds);
    if !bounds_ok && !is_maximized && !is_full_screen {
        return None;
    }

    let state = PersistedState {
        window_bounds: parsed_bounds
            .filter(|wb| wb.width > 0 && wb.height > 0)
            .unwrap_or_else(|| WindowBounds::unplaced(fallback_width, fallback_height)),
        display_bounds: parse_display_bounds(obj.get("displayBounds")),
        is_maximized,
        is_full_screen,
    };
    is_valid_record(&state).then_some(state)
}
