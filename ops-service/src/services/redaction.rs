//! Masking of sensitive configuration values before they leave the process.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Replacement for any value whose key looks sensitive.
pub const CLEANSED_SUBSTITUTE: &str = "********************";

/// Fragments that mark a key as sensitive, matched case-insensitively.
const HIDDEN_SETTINGS: [&str; 6] = ["API", "TOKEN", "KEY", "SECRET", "PASS", "SIGNATURE"];

pub fn is_sensitive(key: &str) -> bool {
    let upper = key.to_uppercase();
    HIDDEN_SETTINGS
        .iter()
        .any(|fragment| upper.contains(fragment))
}

/// Cleanse a single setting. Objects are cleansed key by key so a secret
/// nested under an innocuous name is still masked.
pub fn cleanse_setting(key: &str, value: &Value) -> Value {
    if is_sensitive(key) {
        return Value::String(CLEANSED_SUBSTITUTE.to_string());
    }

    match value {
        Value::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), cleanse_setting(k, v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Only names written entirely in upper case are settings.
fn is_setting_name(key: &str) -> bool {
    key.chars().any(char::is_alphabetic) && !key.chars().any(char::is_lowercase)
}

/// The safe settings snapshot: setting names mapped to cleansed values,
/// ordered by key.
pub fn safe_settings(raw: &Map<String, Value>) -> BTreeMap<String, Value> {
    raw.iter()
        .filter(|(key, _)| is_setting_name(key))
        .map(|(key, value)| (key.clone(), cleanse_setting(key, value)))
        .collect()
}

/// Text shown for a cleansed value. Strings are shown verbatim, null stays
/// absent and anything else is rendered as compact JSON.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
