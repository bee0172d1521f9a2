//! npm invocations and `package.json` inspection.

use crate::error::{Result, TigoError};
use crate::paths;
use crate::rc::plugins::scoped_package;
use crate::version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};

/// Installs and removes node packages in a project directory.
pub trait PackageManager {
    /// `npm install` with no arguments installs the manifest's dependencies.
    fn install(&self, dir: &Path, packages: &[&str]) -> Result<()>;

    fn uninstall(&self, dir: &Path, packages: &[&str]) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct Npm;

impl Npm {
    fn run(&self, dir: &Path, verb: &str, packages: &[&str]) -> Result<()> {
        let command = std::iter::once("npm")
            .chain(std::iter::once(verb))
            .chain(packages.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        let npm = which::which("npm").map_err(|_| TigoError::PackageManager {
            command: command.clone(),
            message: "npm is not installed".to_string(),
        })?;
        tracing::debug!(%command, dir = %dir.display(), "running package manager");
        let output = Command::new(npm)
            .arg(verb)
            .args(packages)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| TigoError::PackageManager {
                command: command.clone(),
                message: e.to_string(),
            })?;
        if output.status.success() {
            return Ok(());
        }
        Err(TigoError::PackageManager {
            command,
            message: last_lines(&String::from_utf8_lossy(&output.stderr), 5)
                .unwrap_or_else(|| format!("exited with {}", output.status)),
        })
    }
}

impl PackageManager for Npm {
    fn install(&self, dir: &Path, packages: &[&str]) -> Result<()> {
        self.run(dir, "install", packages)
    }

    fn uninstall(&self, dir: &Path, packages: &[&str]) -> Result<()> {
        self.run(dir, "remove", packages)
    }
}

fn last_lines(text: &str, n: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }
    Some(lines[lines.len().saturating_sub(n)..].join("\n"))
}

// ---------------------------------------------------------------------------
// package.json
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl Manifest {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = paths::package_json_path(dir);
        if !path.is_file() {
            return Err(TigoError::ServerNotFound(format!(
                "{} (package.json is missing)",
                dir.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn depends_on(&self, package: &str) -> bool {
        self.dependencies.contains_key(package) || self.dev_dependencies.contains_key(package)
    }

    /// Version of `package` installed under `node_modules`, else the
    /// version its dependency range starts from.
    pub fn installed_version(&self, dir: &Path, package: &str) -> Option<String> {
        #[derive(Deserialize)]
        struct Installed {
            version: String,
        }
        let installed = dir
            .join("node_modules")
            .join(package)
            .join(paths::PACKAGE_JSON);
        if let Ok(content) = std::fs::read_to_string(&installed) {
            match serde_json::from_str::<Installed>(&content) {
                Ok(found) => return Some(found.version),
                Err(e) => tracing::debug!(path = %installed.display(), "unreadable manifest: {e}"),
            }
        }
        let range = self
            .dependencies
            .get(package)
            .or_else(|| self.dev_dependencies.get(package))?;
        version::normalize(range).map(str::to_string)
    }

    /// The installed package for module `name`: the `@tigojs/` scoped
    /// package first, then `name` as given.
    pub fn resolve_module(&self, name: &str) -> Option<String> {
        let scoped = scoped_package(name);
        if self.depends_on(&scoped) {
            Some(scoped)
        } else if self.depends_on(name) {
            Some(name.to_string())
        } else {
            None
        }
    }
}
