//! Flat JSON key/value files under the per-user tigo directory.
//!
//! Two files use this: `store.json` (process record, environment check
//! flag) and `userconfig.json` (CLI settings). Both survive across
//! invocations; nothing locks them.

use crate::error::Result;
use crate::io;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Store key recording that the node/npm environment check has passed.
pub const ENV_CHECK_PASSED: &str = "envCheckPassed";

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonStore {
    /// Load the store at `path`. A missing or unreadable file yields an empty
    /// store; it is rewritten on the next `set`.
    pub fn load(path: &Path) -> Result<Self> {
        let values = match io::read_json(path) {
            Ok(Some(Value::Object(map))) => map,
            Ok(Some(_)) => {
                tracing::warn!(path = %path.display(), "store is not a JSON object, ignoring it");
                Map::new()
            }
            Ok(None) => Map::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read store, ignoring it: {e}");
                Map::new()
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value for `key`; JSON `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    /// Set `key` and write the file.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.save()
    }

    /// Drop `keys` and write the file.
    pub fn remove(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.values.shift_remove(*key);
        }
        self.save()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter().filter(|(_, v)| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    fn save(&self) -> Result<()> {
        let doc = Value::Object(self.values.clone());
        io::atomic_write(&self.path, io::to_pretty_json(&doc)?.as_bytes())
    }
}
