//! Feature property dictionaries and the structural flags recognised in them.

use serde_json::{Map, Value};

pub type Properties = Map<String, Value>;

/// Keys that steer composition and never reach an emitted feature as authored.
pub const STRUCTURAL_KEYS: [&str; 5] = ["boundary", "children", "group", "layer", "region"];

/// Keys left out of output records.
pub const IGNORED_OUTPUT_KEYS: [&str; 13] = [
    "boundary",
    "children",
    "group",
    "layer",
    "region",
    "divider",
    "invisible",
    "closed",
    "exterior",
    "interior",
    "siblings",
    "marker",
    "annotation",
];

/// Whether `key` is set to a truthy value: `true`, a non-zero number, a non-empty string, array
/// or object.
pub fn flag(properties: &Properties, key: &str) -> bool {
    match properties.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// The free-text annotation, or `""` when there is none.
pub fn annotation(properties: &Properties) -> &str {
    properties
        .get("annotation")
        .and_then(Value::as_str)
        .unwrap_or("")
}

pub fn is_unannotated(properties: &Properties) -> bool {
    annotation(properties).is_empty()
}

/// Copies every entry of `over` into `base`, replacing existing keys.
pub fn merge(base: &mut Properties, over: &Properties) {
    for (key, value) in over {
        base.insert(key.clone(), value.clone());
    }
}

pub fn is_structural(key: &str) -> bool {
    STRUCTURAL_KEYS.contains(&key)
}

pub fn ignore_output_key(key: &str) -> bool {
    IGNORED_OUTPUT_KEYS.contains(&key)
}
