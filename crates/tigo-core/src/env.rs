//! Node.js environment check, run before commands that need node or npm.

use crate::error::{Result, TigoError};
use crate::store::{JsonStore, ENV_CHECK_PASSED};
use serde_json::Value;
use std::process::{Command, Stdio};

pub const MIN_NODE_MAJOR: u64 = 14;

/// `--version` output of `bin`, if it runs successfully.
pub fn tool_version(bin: &str) -> Option<String> {
    let path = which::which(bin).ok()?;
    let output = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}

/// Major version from `v16.20.1` or `16.20.1`.
pub fn major_version(version: &str) -> Option<u64> {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .next()?
        .parse()
        .ok()
}

/// Check that node (at least [`MIN_NODE_MAJOR`]) and npm are installed.
/// A pass is remembered in the store and later calls return immediately.
pub fn check(store: &mut JsonStore) -> Result<()> {
    check_with(store, tool_version)
}

pub fn check_with(
    store: &mut JsonStore,
    version_of: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if store.get_bool(ENV_CHECK_PASSED) == Some(true) {
        return Ok(());
    }
    tracing::debug!("checking node.js environment");
    let node = version_of("node").ok_or_else(|| {
        TigoError::Environment("cannot find node.js, please install it first".to_string())
    })?;
    let major = major_version(&node).ok_or_else(|| {
        TigoError::Environment(format!("cannot parse node.js version '{node}'"))
    })?;
    if major < MIN_NODE_MAJOR {
        return Err(TigoError::Environment(format!(
            "node.js {node} is too old, tigo needs v{MIN_NODE_MAJOR} or above"
        )));
    }
    if version_of("npm").is_none() {
        return Err(TigoError::Environment(
            "cannot find npm, please install it first".to_string(),
        ));
    }
    store.set(ENV_CHECK_PASSED, Value::Bool(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> JsonStore {
        JsonStore::load(&dir.path().join("store.json")).unwrap()
    }

    #[test]
    fn parses_major() {
        assert_eq!(major_version("v16.20.1"), Some(16));
        assert_eq!(major_version("14.0.0\n"), Some(14));
        assert_eq!(major_version("node"), None);
    }

    #[test]
    fn pass_is_cached() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        let calls = Cell::new(0);
        let probe = |bin: &str| {
            calls.set(calls.get() + 1);
            Some(if bin == "node" { "v18.1.0" } else { "9.6.0" }.to_string())
        };
        check_with(&mut s, probe).unwrap();
        assert_eq!(calls.get(), 2);
        check_with(&mut s, probe).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(store(&dir).get_bool(ENV_CHECK_PASSED), Some(true));
    }

    #[test]
    fn old_node_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        let err = check_with(&mut s, |_| Some("v12.22.0".to_string())).unwrap_err();
        assert!(matches!(err, TigoError::Environment(m) if m.contains("too old")));
        assert_eq!(s.get_bool(ENV_CHECK_PASSED), None);
    }

    #[test]
    fn missing_npm_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        let err = check_with(&mut s, |bin| {
            (bin == "node").then(|| "v20.0.0".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, TigoError::Environment(m) if m.contains("npm")));
    }
}
