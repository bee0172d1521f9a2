use crate::error::{Result, TigoError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Registry scope of official plugins.
pub const PLUGIN_SCOPE: &str = "@tigojs/";

/// A named plugin node under `plugins` in the runtime config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// Registry package name for a plugin: `auth` → `@tigojs/auth`. Names that
/// already carry a scope are kept as-is.
pub fn scoped_package(name: &str) -> String {
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("{PLUGIN_SCOPE}{name}")
    }
}

fn package_matches(package: &str, name: &str) -> bool {
    package == name || package.strip_prefix(PLUGIN_SCOPE) == Some(name)
}

fn plugins_map(doc: &Value) -> Option<&Map<String, Value>> {
    doc.get("plugins").and_then(Value::as_object)
}

/// Key of the plugin entry whose `package` is `name`, with or without the
/// official scope.
pub fn find_plugin<'a>(doc: &'a Value, name: &str) -> Option<&'a str> {
    plugins_map(doc)?.iter().find_map(|(key, node)| {
        let package = node.get("package").and_then(Value::as_str)?;
        package_matches(package, name).then_some(key.as_str())
    })
}

/// Create or update `plugins.<name>` so it points at `package`. An existing
/// `config` block is kept.
pub fn upsert_plugin(doc: &mut Value, name: &str, package: &str) -> Result<()> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| TigoError::InvalidConfig("top level must be a mapping".to_string()))?;
    let plugins = root
        .entry("plugins")
        .or_insert_with(|| Value::Object(Map::new()));
    if plugins.is_null() {
        *plugins = Value::Object(Map::new());
    }
    let plugins = plugins
        .as_object_mut()
        .ok_or_else(|| TigoError::NotAMapping("plugins".to_string()))?;
    match plugins.get_mut(name).and_then(Value::as_object_mut) {
        Some(node) => {
            node.insert("package".to_string(), Value::String(package.to_string()));
        }
        None => {
            let entry = PluginEntry {
                package: package.to_string(),
                config: None,
            };
            plugins.insert(name.to_string(), serde_json::to_value(entry)?);
        }
    }
    Ok(())
}

/// Remove the first plugin entry whose `package` equals `package`. Returns
/// the key that was removed.
pub fn remove_plugin_by_package(doc: &mut Value, package: &str) -> Option<String> {
    let plugins = doc.get_mut("plugins")?.as_object_mut()?;
    let key = plugins
        .iter()
        .find(|(_, node)| node.get("package").and_then(Value::as_str) == Some(package))
        .map(|(key, _)| key.clone())?;
    plugins.shift_remove(&key);
    Some(key)
}
