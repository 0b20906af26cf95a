use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::Result;

/// Persistent JSON key-value settings with built-in defaults.
///
/// Missing top-level keys are filled from the defaults on load. A file that
/// does not parse as a JSON object is ignored with a warning.
#[derive(Clone, Debug)]
pub struct Config {
    path: PathBuf,
    data: Map<String, Value>,
    defaults: Map<String, Value>,
}

impl Config {
    /// Create a config bound to `path` and load it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let defaults = default_values();
        let mut config = Self {
            path: path.into(),
            data: defaults.clone(),
            defaults,
        };
        config.load();
        config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload from disk. A missing file leaves the defaults in place.
    pub fn load(&mut self) {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {:?}, using defaults", self.path);
                self.data = self.defaults.clone();
                return;
            }
            Err(e) => {
                log::warn!("Error reading config {:?}: {}", self.path, e);
                self.data = self.defaults.clone();
                return;
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(mut data)) => {
                for (key, value) in &self.defaults {
                    data.entry(key.clone()).or_insert_with(|| value.clone());
                }
                self.data = data;
            }
            Ok(_) => {
                log::warn!("Config {:?} is not a JSON object, using defaults", self.path);
                self.data = self.defaults.clone();
            }
            Err(e) => {
                log::warn!("Error loading config {:?}: {}", self.path, e);
                self.data = self.defaults.clone();
            }
        }
    }

    /// Write the current values as indented JSON.
    pub fn save(&self) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Deserialize a top-level value, `None` if missing or of the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|value| T::deserialize(value).ok())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Walk nested objects, e.g. `["controls", "jump"]`.
    pub fn get_nested(&self, keys: &[&str]) -> Option<&Value> {
        let (first, rest) = keys.split_first()?;
        let mut value = self.data.get(*first)?;
        for key in rest {
            value = value.as_object()?.get(*key)?;
        }
        Some(value)
    }

    /// Set a nested value, replacing any non-object along the way with an
    /// empty object. One key sets a top-level value; no keys does nothing.
    pub fn set_nested(&mut self, keys: &[&str], value: impl Into<Value>) {
        let Some((last, parents)) = keys.split_last() else {
            return;
        };
        let mut current = &mut self.data;
        for key in parents {
            let entry = current.entry(key.to_string()).or_insert(Value::Null);
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert(last.to_string(), value.into());
    }

    pub fn reset_to_defaults(&mut self) {
        self.data = self.defaults.clone();
    }

    /// Restore one key to its default; keys without a default are left alone.
    pub fn reset_key(&mut self, key: &str) {
        if let Some(value) = self.defaults.get(key) {
            self.data.insert(key.to_string(), value.clone());
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn get_all(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Shallow merge of `values` into the top level.
    pub fn update(&mut self, values: Map<String, Value>) {
        self.data.extend(values);
    }
}

fn default_values() -> Map<String, Value> {
    let defaults = json!({
        "screen_width": 800,
        "screen_height": 600,
        "fullscreen": false,
        "fps": 60,

        "music_volume": 1.0,
        "sound_volume": 1.0,
        "mute_music": false,
        "mute_sound": false,

        "difficulty": "normal",
        "language": "en",

        "controls": {
            "up": "w",
            "down": "s",
            "left": "a",
            "right": "d",
            "jump": "space",
            "action": "e"
        }
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
