//! Per-user CLI settings (`userconfig.json`).

use crate::error::Result;
use crate::lifecycle::Backend;
use crate::store::JsonStore;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const API_HOST: &str = "api_host";
pub const ACCESS_KEY: &str = "access_key";
pub const SECRET_KEY: &str = "secret_key";
pub const SERVER_DEFAULT_START_TYPE: &str = "server_default_start_type";
pub const SERVER_DIR: &str = "server_dir";
pub const SERVER_INTERNAL_BASE: &str = "server_internal_base";
pub const SERVER_EXTERNAL_BASE: &str = "server_external_base";
pub const PM2_INSTALLED: &str = "pm2_installed";

/// Keys the CLI itself reads. Other keys are stored and listed untouched.
pub const KNOWN_KEYS: &[&str] = &[
    API_HOST,
    ACCESS_KEY,
    SECRET_KEY,
    SERVER_DEFAULT_START_TYPE,
    SERVER_DIR,
    SERVER_INTERNAL_BASE,
    SERVER_EXTERNAL_BASE,
    PM2_INSTALLED,
];

#[derive(Debug, Clone)]
pub struct UserConfig {
    store: JsonStore,
}

impl UserConfig {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            store: JsonStore::load(path)?,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.store.set(key, value)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.store.entries()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Server directory override; relative paths resolve against `work_dir`.
    pub fn server_dir(&self, work_dir: &Path) -> Option<PathBuf> {
        self.store
            .get_str(SERVER_DIR)
            .filter(|s| !s.is_empty())
            .map(|s| work_dir.join(s))
    }

    /// Preferred backend for `start`. Unknown values are ignored.
    pub fn default_start_type(&self) -> Option<Backend> {
        self.store
            .get_str(SERVER_DEFAULT_START_TYPE)
            .and_then(|s| s.parse().ok())
    }

    pub fn pm2_installed(&self) -> bool {
        self.store.get_bool(PM2_INSTALLED).unwrap_or(false)
    }

    pub fn set_pm2_installed(&mut self, installed: bool) -> Result<()> {
        self.store.set(PM2_INSTALLED, Value::Bool(installed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn typed_accessors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("userconfig.json");
        std::fs::write(
            &path,
            r#"{"server_dir": "srv", "server_default_start_type": "directly", "pm2_installed": true}"#,
        )
        .unwrap();
        let cfg = UserConfig::load(&path).unwrap();
        assert_eq!(
            cfg.server_dir(Path::new("/work")),
            Some(PathBuf::from("/work/srv"))
        );
        assert_eq!(cfg.default_start_type(), Some(Backend::Directly));
        assert!(cfg.pm2_installed());
    }

    #[test]
    fn absolute_server_dir_and_unknown_start_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("userconfig.json");
        let mut cfg = UserConfig::load(&path).unwrap();
        cfg.set(SERVER_DIR, json!("/opt/tigo")).unwrap();
        cfg.set(SERVER_DEFAULT_START_TYPE, json!("docker")).unwrap();
        assert_eq!(
            cfg.server_dir(Path::new("/work")),
            Some(PathBuf::from("/opt/tigo"))
        );
        assert_eq!(cfg.default_start_type(), None);
        assert!(!cfg.pm2_installed());
    }

    #[test]
    fn pm2_flag_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("userconfig.json");
        let mut cfg = UserConfig::load(&path).unwrap();
        cfg.set_pm2_installed(true).unwrap();
        assert!(UserConfig::load(&path).unwrap().pm2_installed());
    }
}
