//! Adding, upgrading and removing official plugin modules on a server.

use crate::error::{Result, TigoError};
use crate::npm::{Manifest, PackageManager};
use crate::rc::plugins::{self, scoped_package};
use crate::rc::{OpenRc, RcSource};
use crate::registry::Registry;
use crate::version;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub name: String,
    pub package: String,
    pub version: String,
    /// A plugin entry for this module was already present.
    pub already_present: bool,
    /// A `.tigorc.js` config was rewritten as `.tigorc.json`.
    pub converted_js: bool,
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub package: String,
    /// Key of the plugin entry that was dropped, if there was one.
    pub removed_entry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The installed version is already the registry's latest.
    UpToDate { package: String, version: String },
    Upgraded {
        package: String,
        from: Option<String>,
        to: String,
    },
}

/// Install `@tigojs/<name>` into `server_dir` and register it under
/// `plugins.<name>` in the runtime config.
pub fn add_plugin(
    server_dir: &Path,
    name: &str,
    registry: &Registry,
    pm: &dyn PackageManager,
) -> Result<AddOutcome> {
    let mut rc = OpenRc::open_runtime(server_dir)?;
    let already_present = plugins::find_plugin(&rc.doc, name).is_some();
    if already_present {
        tracing::info!("module {name} is already registered");
    }

    let package = scoped_package(name);
    tracing::info!("fetching package information of {package}");
    let info = registry.latest(&package)?;
    tracing::info!("detected version {}, installing", info.version);
    pm.install(server_dir, &[&package])?;

    plugins::upsert_plugin(&mut rc.doc, name, &package)?;
    let converted_js = match &rc.source {
        RcSource::Runtime(status) => !status.json.exists && status.js.exists,
        RcSource::Dev(_) => false,
    };
    let config_path = rc.save_as_json()?;

    Ok(AddOutcome {
        name: name.to_string(),
        package,
        version: info.version,
        already_present,
        converted_js,
        config_path,
    })
}

/// Uninstall module `name` from `server_dir` and drop its plugin entry.
pub fn remove_plugin(
    server_dir: &Path,
    name: &str,
    pm: &dyn PackageManager,
) -> Result<RemoveOutcome> {
    let manifest = Manifest::load(server_dir)?;
    let package = manifest
        .resolve_module(name)
        .ok_or_else(|| TigoError::PluginNotInstalled(name.to_string()))?;

    pm.uninstall(server_dir, &[&package])?;

    tracing::debug!("processing the runtime config");
    let removed_entry = match OpenRc::open_runtime(server_dir) {
        Ok(mut rc) => {
            let removed = plugins::remove_plugin_by_package(&mut rc.doc, &package);
            if removed.is_some() {
                rc.save()?;
            }
            removed
        }
        Err(TigoError::ConfigNotFound(_)) => {
            tracing::warn!("no runtime config found, only the package was removed");
            None
        }
        Err(e) => return Err(e),
    };

    Ok(RemoveOutcome {
        package,
        removed_entry,
    })
}

/// Bring installed module `name` up to the registry's latest version.
pub fn upgrade_plugin(
    server_dir: &Path,
    name: &str,
    registry: &Registry,
    pm: &dyn PackageManager,
) -> Result<UpgradeOutcome> {
    let manifest = Manifest::load(server_dir)?;
    let package = manifest
        .resolve_module(name)
        .ok_or_else(|| TigoError::PluginNotInstalled(name.to_string()))?;
    let installed = manifest.installed_version(server_dir, &package);

    let latest = registry.latest(&package)?;
    tracing::debug!(
        installed = installed.as_deref().unwrap_or("unknown"),
        latest = %latest.version,
        "checking {package}"
    );
    if let Some(current) = &installed {
        if !version::is_newer(&latest.version, current) {
            return Ok(UpgradeOutcome::UpToDate {
                package,
                version: current.clone(),
            });
        }
    }

    pm.install(server_dir, &[&format!("{package}@{}", latest.version)])?;
    Ok(UpgradeOutcome::Upgraded {
        package,
        from: installed,
        to: latest.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingPm {
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl PackageManager for RecordingPm {
        fn install(&self, _: &Path, packages: &[&str]) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("install {}", packages.join(" ")));
            if self.fail {
                return Err(TigoError::PackageManager {
                    command: "npm install".to_string(),
                    message: "E404".to_string(),
                });
            }
            Ok(())
        }

        fn uninstall(&self, _: &Path, packages: &[&str]) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("remove {}", packages.join(" ")));
            Ok(())
        }
    }

    fn latest_body(name: &str) -> String {
        json!({
            "name": name,
            "version": "0.3.1",
            "dist": { "tarball": "http://unused/x.tgz" }
        })
        .to_string()
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn add_registers_plugin_and_converts_js() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".tigorc.js"),
            "module.exports = {\n  server: { port: 5099 },\n};\n",
        )
        .unwrap();
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/@tigojs%2fapi-kv/latest")
            .with_status(200)
            .with_body(latest_body("@tigojs/api-kv"))
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let pm = RecordingPm::default();

        let out = add_plugin(dir.path(), "api-kv", &reg, &pm).unwrap();
        assert_eq!(out.package, "@tigojs/api-kv");
        assert_eq!(out.version, "0.3.1");
        assert!(!out.already_present);
        assert!(out.converted_js);
        assert_eq!(*pm.calls.borrow(), vec!["install @tigojs/api-kv"]);

        assert!(!dir.path().join(".tigorc.js").exists());
        let doc = read_json(&dir.path().join(".tigorc.json"));
        assert_eq!(doc["server"]["port"], json!(5099));
        assert_eq!(doc["plugins"]["api-kv"], json!({ "package": "@tigojs/api-kv" }));
    }

    #[test]
    fn add_keeps_existing_entry_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".tigorc.json"),
            json!({
                "server": { "port": 5099 },
                "plugins": { "api-kv": { "package": "@tigojs/api-kv", "config": { "ttl": 5 } } }
            })
            .to_string(),
        )
        .unwrap();
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/@tigojs%2fapi-kv/latest")
            .with_status(200)
            .with_body(latest_body("@tigojs/api-kv"))
            .create();
        let reg = Registry::new(&server.url()).unwrap();

        let out = add_plugin(dir.path(), "api-kv", &reg, &RecordingPm::default()).unwrap();
        assert!(out.already_present);
        assert!(!out.converted_js);
        let doc = read_json(&dir.path().join(".tigorc.json"));
        assert_eq!(doc["plugins"]["api-kv"]["config"]["ttl"], json!(5));
    }

    #[test]
    fn add_unknown_package_leaves_config_alone() {
        let dir = TempDir::new().unwrap();
        let rc = dir.path().join(".tigorc.json");
        std::fs::write(&rc, "{\"server\":{\"port\":5099}}").unwrap();
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/@tigojs%2fnope/latest")
            .with_status(404)
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let pm = RecordingPm::default();

        let err = add_plugin(dir.path(), "nope", &reg, &pm).unwrap_err();
        assert!(matches!(err, TigoError::PackageNotFound(_)));
        assert!(pm.calls.borrow().is_empty());
        assert_eq!(
            std::fs::read_to_string(&rc).unwrap(),
            "{\"server\":{\"port\":5099}}"
        );
    }

    #[test]
    fn add_install_failure_is_propagated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".tigorc.json"),
            "{\"server\":{\"port\":5099}}",
        )
        .unwrap();
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/@tigojs%2fapi-kv/latest")
            .with_status(200)
            .with_body(latest_body("@tigojs/api-kv"))
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let pm = RecordingPm {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            add_plugin(dir.path(), "api-kv", &reg, &pm),
            Err(TigoError::PackageManager { .. })
        ));
    }

    #[test]
    fn remove_drops_matching_entry() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            json!({ "dependencies": { "@tigojs/api-kv": "^0.3.1" } }).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(".tigorc.json"),
            json!({
                "server": { "port": 5099 },
                "plugins": {
                    "kv": { "package": "@tigojs/api-kv" },
                    "auth": { "package": "@tigojs/auth" }
                }
            })
            .to_string(),
        )
        .unwrap();
        let pm = RecordingPm::default();

        let out = remove_plugin(dir.path(), "api-kv", &pm).unwrap();
        assert_eq!(out.package, "@tigojs/api-kv");
        assert_eq!(out.removed_entry.as_deref(), Some("kv"));
        assert_eq!(*pm.calls.borrow(), vec!["remove @tigojs/api-kv"]);
        let doc = read_json(&dir.path().join(".tigorc.json"));
        assert_eq!(doc["plugins"], json!({ "auth": { "package": "@tigojs/auth" } }));
    }

    #[test]
    fn remove_uninstalled_module_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let pm = RecordingPm::default();
        assert!(matches!(
            remove_plugin(dir.path(), "api-kv", &pm),
            Err(TigoError::PluginNotInstalled(n)) if n == "api-kv"
        ));
        assert!(pm.calls.borrow().is_empty());
    }

    fn server_with_dependency(range: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            json!({ "dependencies": { "@tigojs/api-kv": range } }).to_string(),
        )
        .unwrap();
        dir
    }

    #[test]
    fn upgrade_installs_newer_release() {
        let dir = server_with_dependency("^0.2.0");
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/@tigojs%2fapi-kv/latest")
            .with_status(200)
            .with_body(latest_body("@tigojs/api-kv"))
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let pm = RecordingPm::default();

        let out = upgrade_plugin(dir.path(), "api-kv", &reg, &pm).unwrap();
        assert_eq!(
            out,
            UpgradeOutcome::Upgraded {
                package: "@tigojs/api-kv".to_string(),
                from: Some("0.2.0".to_string()),
                to: "0.3.1".to_string(),
            }
        );
        assert_eq!(*pm.calls.borrow(), vec!["install @tigojs/api-kv@0.3.1"]);
    }

    #[test]
    fn upgrade_skips_latest_install() {
        let dir = server_with_dependency("^0.2.0");
        let installed = dir.path().join("node_modules/@tigojs/api-kv");
        std::fs::create_dir_all(&installed).unwrap();
        std::fs::write(installed.join("package.json"), r#"{"version":"0.3.1"}"#).unwrap();
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/@tigojs%2fapi-kv/latest")
            .with_status(200)
            .with_body(latest_body("@tigojs/api-kv"))
            .create();
        let reg = Registry::new(&server.url()).unwrap();
        let pm = RecordingPm::default();

        let out = upgrade_plugin(dir.path(), "api-kv", &reg, &pm).unwrap();
        assert_eq!(
            out,
            UpgradeOutcome::UpToDate {
                package: "@tigojs/api-kv".to_string(),
                version: "0.3.1".to_string(),
            }
        );
        assert!(pm.calls.borrow().is_empty());
    }

    #[test]
    fn upgrade_requires_installed_module() {
        let dir = server_with_dependency("^0.2.0");
        let server = mockito::Server::new();
        let reg = Registry::new(&server.url()).unwrap();
        let pm = RecordingPm::default();
        assert!(matches!(
            upgrade_plugin(dir.path(), "auth", &reg, &pm),
            Err(TigoError::PluginNotInstalled(n)) if n == "auth"
        ));
        assert!(pm.calls.borrow().is_empty());
    }
}
