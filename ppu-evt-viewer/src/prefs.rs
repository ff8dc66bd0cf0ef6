use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A persistent, string-encoded key-value store for user preferences
///
/// Every key is independent and writes are last-writer-wins.
pub trait Preferences {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);

    /// Booleans are stored as `"true"` / `"false"`; anything else reads as `false`
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(value) => value == "true",
            None => default,
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, if value { "true" } else { "false" }.to_string());
    }

    fn get_i64(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(value) => match value.trim().parse::<i64>() {
                Ok(value) => value,
                Err(_) => {
                    log::warn!("Ignoring non-integer preference {key}={value:?}");
                    default
                }
            },
            None => default,
        }
    }

    fn set_i64(&mut self, key: &str, value: i64) {
        self.set(key, value.to_string());
    }
}

/// In-memory preferences that can be saved and restored as a JSON object
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

#[test]
fn test_typed_defaults() {
    let mut prefs = MemoryPreferences::new();
    assert!(!prefs.get_bool("ref-hide", false));
    assert_eq!(prefs.get_i64("ref-offset", 12), 12);
    assert_eq!(prefs.get("missing"), None);

    prefs.set_bool("ref-hide", true);
    prefs.set_i64("ref-offset", -3);
    assert!(prefs.get_bool("ref-hide", false));
    assert_eq!(prefs.get_i64("ref-offset", 12), -3);

    prefs.set("ref-offset", "garbage".to_string());
    assert_eq!(prefs.get_i64("ref-offset", 12), 12);
}

#[test]
fn test_json_round_trip() {
    let mut prefs = MemoryPreferences::new();
    prefs.set_bool("SAVE_CHECKBOX_LX_INC", true);
    prefs.set_i64("ref-offset", 20);

    let json = prefs.to_json().unwrap();
    let restored = MemoryPreferences::from_json(&json).unwrap();
    assert_eq!(restored, prefs);
    assert!(MemoryPreferences::from_json("not json").is_err());
}
