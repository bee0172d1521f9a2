use crate::error::{Result, TigoError};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Project-relative names
// ---------------------------------------------------------------------------

pub const RC_JSON_FILE: &str = ".tigorc.json";
pub const RC_JS_FILE: &str = ".tigorc.js";
pub const DEV_CONFIG_FILE: &str = ".tigodev";
pub const SERVER_MAIN_FILE: &str = "server.js";
pub const PACKAGE_JSON: &str = "package.json";
pub const ECOSYSTEM_FILE: &str = "ecosystem.config.js";

// ---------------------------------------------------------------------------
// Per-user names (under the tigo home directory)
// ---------------------------------------------------------------------------

pub const TIGO_HOME_DIR: &str = ".tigo";
pub const STORE_FILE: &str = "store.json";
pub const USER_CONFIG_FILE: &str = "userconfig.json";
pub const TEMP_DIR: &str = "temp";

/// Environment variable overriding the per-user tigo directory.
pub const TIGO_HOME_ENV: &str = "TIGO_HOME";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn rc_json_path(dir: &Path) -> PathBuf {
    dir.join(RC_JSON_FILE)
}

pub fn rc_js_path(dir: &Path) -> PathBuf {
    dir.join(RC_JS_FILE)
}

pub fn dev_config_path(dir: &Path) -> PathBuf {
    dir.join(DEV_CONFIG_FILE)
}

pub fn server_main_path(server_dir: &Path) -> PathBuf {
    server_dir.join(SERVER_MAIN_FILE)
}

pub fn package_json_path(dir: &Path) -> PathBuf {
    dir.join(PACKAGE_JSON)
}

pub fn ecosystem_path(server_dir: &Path) -> PathBuf {
    server_dir.join(ECOSYSTEM_FILE)
}

pub fn store_path(tigo_home: &Path) -> PathBuf {
    tigo_home.join(STORE_FILE)
}

pub fn user_config_path(tigo_home: &Path) -> PathBuf {
    tigo_home.join(USER_CONFIG_FILE)
}

pub fn temp_dir(tigo_home: &Path) -> PathBuf {
    tigo_home.join(TEMP_DIR)
}

/// Resolve the per-user tigo directory: `$TIGO_HOME`, else `~/.tigo`.
pub fn tigo_home() -> Result<PathBuf> {
    if let Some(explicit) = std::env::var_os(TIGO_HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(explicit));
    }
    let home = home::home_dir().ok_or(TigoError::HomeNotFound)?;
    Ok(home.join(TIGO_HOME_DIR))
}

/// A server directory holds the server entry point and its package manifest.
pub fn is_server_dir(dir: &Path) -> bool {
    server_main_path(dir).is_file() && package_json_path(dir).is_file()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
