use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notification_icons::{HandlerId, PrefError, PrefKey, PreferenceStore, SignalTable};
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

/// Preferences stored in a JSON object, keyed by the kebab-case preference names.
///
/// The file is read on construction and on [`JsonPreferences::reload`]; nothing is written back
/// unless [`JsonPreferences::save`] is called.
#[derive(Debug)]
pub struct JsonPreferences {
    path: PathBuf,
    values: Map<String, Value>,
    signals: SignalTable<PrefKey>,
}

impl JsonPreferences {
    /// Read preferences from `path`. A missing file counts as empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = read_values(&path)?;
        Ok(Self { path, values, signals: SignalTable::new() })
    }

    /// Like [`JsonPreferences::load`], but falls back to empty preferences if the file is broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(prefs) => prefs,
            Err(err) => {
                log::error!("{:?}", err);
                Self { path: path.to_path_buf(), values: Map::new(), signals: SignalTable::new() }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file. Returns the keys that changed and have a handler connected.
    ///
    /// If the file can't be read, the previous values stay in place.
    pub fn reload(&mut self) -> Result<Vec<PrefKey>> {
        let values = read_values(&self.path)?;
        let changed = PrefKey::iter()
            .filter(|key| {
                let name: &str = key.as_ref();
                self.values.get(name) != values.get(name)
            })
            .filter(|key| self.signals.is_connected(key))
            .collect();
        self.values = values;
        Ok(changed)
    }

    fn value(&self, key: PrefKey) -> Option<&Value> {
        let name: &str = key.as_ref();
        self.values.get(name)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content + "\n")
            .with_context(|| format!("Failed to write preferences to {}", self.path.display()))
    }
}

fn read_values(path: &Path) -> Result<Map<String, Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read preferences from {}", path.display())),
    };
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(&content).with_context(|| format!("Failed to parse preferences in {}", path.display()))
}

impl PreferenceStore for JsonPreferences {
    fn get_bool(&self, key: PrefKey) -> Result<bool, PrefError> {
        match self.value(key) {
            Some(value) => value.as_bool().ok_or(PrefError::WrongType { key, expected: "boolean" }),
            None => Err(PrefError::Missing(key)),
        }
    }

    fn get_int(&self, key: PrefKey) -> Result<i32, PrefError> {
        match self.value(key) {
            Some(value) => value
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .ok_or(PrefError::WrongType { key, expected: "32-bit integer" }),
            None => Err(PrefError::Missing(key)),
        }
    }

    fn set_bool(&mut self, key: PrefKey, value: bool) -> Result<(), PrefError> {
        self.values.insert(key.to_string(), Value::Bool(value));
        Ok(())
    }

    fn set_int(&mut self, key: PrefKey, value: i32) -> Result<(), PrefError> {
        self.values.insert(key.to_string(), Value::from(value));
        Ok(())
    }

    fn connect_changed(&mut self, key: PrefKey) -> HandlerId {
        self.signals.connect(key)
    }

    fn disconnect(&mut self, id: HandlerId) {
        if !self.signals.disconnect(id) {
            log::debug!("{} was not connected to any preference", id);
        }
    }
}
