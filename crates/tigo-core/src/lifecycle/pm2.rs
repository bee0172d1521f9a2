//! The pm2 supervisor backend.

use crate::error::{Result, TigoError};
use crate::paths;
use crate::rc::js;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

/// Upstream ecosystem file offered when a project has none.
pub const ECOSYSTEM_URL: &str =
    "https://raw.githubusercontent.com/tigojs/tigo/main/ecosystem.config.js";
pub const ECOSYSTEM_URL_ENV: &str = "TIGO_ECOSYSTEM_URL";

/// Where to download the ecosystem file from, `TIGO_ECOSYSTEM_URL` first.
pub fn ecosystem_url() -> String {
    std::env::var(ECOSYSTEM_URL_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| ECOSYSTEM_URL.to_string())
}

/// An external process manager that daemonizes the server.
pub trait Supervisor {
    fn name(&self) -> &str;

    /// Whether the supervisor executable can be found.
    fn is_available(&self) -> bool;

    fn start(&self, server_dir: &Path) -> Result<()>;

    fn stop(&self, server_dir: &Path) -> Result<()>;
}

pub struct Pm2 {
    binary: String,
}

impl Default for Pm2 {
    fn default() -> Self {
        Self {
            binary: "pm2".to_string(),
        }
    }
}

impl Pm2 {
    fn locate(&self) -> Result<PathBuf> {
        which::which(&self.binary).map_err(|_| TigoError::BackendUnavailable(self.binary.clone()))
    }
}

impl Supervisor for Pm2 {
    fn name(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        self.locate().is_ok()
    }

    fn start(&self, server_dir: &Path) -> Result<()> {
        let ecosystem = paths::ecosystem_path(server_dir);
        if !ecosystem.is_file() {
            return Err(TigoError::SupervisorConfigMissing(
                ecosystem.display().to_string(),
            ));
        }
        let bin = self.locate()?;
        tracing::debug!("trying to start server with pm2");
        let status = Command::new(bin)
            .arg("start")
            .current_dir(server_dir)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| TigoError::StartFailed(format!("cannot run pm2: {e}")))?;
        if !status.success() {
            return Err(TigoError::StartFailed(format!("pm2 start exited with {status}")));
        }
        Ok(())
    }

    fn stop(&self, server_dir: &Path) -> Result<()> {
        let ecosystem = paths::ecosystem_path(server_dir);
        if !ecosystem.is_file() {
            return Err(TigoError::SupervisorConfigMissing(
                ecosystem.display().to_string(),
            ));
        }
        let app_name = ecosystem_app_name(&std::fs::read_to_string(&ecosystem)?)?;
        let bin = self
            .locate()
            .map_err(|_| TigoError::StopFailed("pm2 is not installed".to_string()))?;
        tracing::debug!(app = %app_name, "trying to stop server with pm2");
        let status = Command::new(bin)
            .args(["stop", &app_name])
            .current_dir(server_dir)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| TigoError::StopFailed(format!("cannot run pm2: {e}")))?;
        if !status.success() {
            return Err(TigoError::StopFailed(format!(
                "pm2 stop {app_name} exited with {status}"
            )));
        }
        Ok(())
    }
}

static APP_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn app_name_re() -> &'static Regex {
    APP_NAME_RE.get_or_init(|| {
        Regex::new(r#"(?s)apps\s*:\s*\[\s*\{.*?\bname\s*:\s*['"]([^'"]+)['"]"#).unwrap()
    })
}

/// Name of the first app declared in an `ecosystem.config.js`.
///
/// Literal-only files go through the config reader; anything else falls
/// back to a pattern match on `apps: [{ ... name: '...' }]`.
pub fn ecosystem_app_name(source: &str) -> Result<String> {
    if let Ok(doc) = js::parse_module(source) {
        if let Some(name) = doc
            .get("apps")
            .and_then(|apps| apps.get(0))
            .and_then(|app| app.get("name"))
            .and_then(|n| n.as_str())
        {
            return Ok(name.to_string());
        }
    }
    app_name_re()
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            TigoError::StopFailed("cannot find an app name in ecosystem.config.js".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn app_name_from_literal_module() {
        let src = "module.exports = {\n  apps: [{ name: 'tigo', script: './server.js' }],\n};\n";
        assert_eq!(ecosystem_app_name(src).unwrap(), "tigo");
    }

    #[test]
    fn app_name_from_module_with_code() {
        let src = r#"
const path = require('path');
module.exports = {
  apps: [
    {
      script: path.resolve(__dirname, './server.js'),
      name: "tigo-server",
      env: { NODE_ENV: 'prod' },
    },
  ],
};
"#;
        assert_eq!(ecosystem_app_name(src).unwrap(), "tigo-server");
    }

    #[test]
    fn app_name_missing() {
        assert!(matches!(
            ecosystem_app_name("module.exports = { apps: [] };"),
            Err(TigoError::StopFailed(_))
        ));
    }

    #[test]
    fn start_without_ecosystem_is_config_missing() {
        let dir = TempDir::new().unwrap();
        let err = Pm2::default().start(dir.path()).unwrap_err();
        assert!(matches!(err, TigoError::SupervisorConfigMissing(_)));
        let err = Pm2::default().stop(dir.path()).unwrap_err();
        assert!(matches!(err, TigoError::SupervisorConfigMissing(_)));
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let pm2 = Pm2 {
            binary: "__tigo_no_such_pm2__".to_string(),
        };
        assert!(!pm2.is_available());
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ecosystem.config.js"),
            "module.exports = { apps: [{ name: 'tigo' }] };",
        )
        .unwrap();
        assert!(matches!(
            pm2.start(dir.path()),
            Err(TigoError::BackendUnavailable(_))
        ));
    }
}
