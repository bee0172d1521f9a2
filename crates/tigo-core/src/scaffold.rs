//! Project initialization from published templates.

use crate::error::{Result, TigoError};
use crate::npm::PackageManager;
use crate::pack;
use crate::registry::{PackageInfo, Registry};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// npm package holding the server template.
pub const SERVER_PACKAGE: &str = "tigo";
const SERVER_CACHE_PREFIX: &str = "server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Server,
}

impl FromStr for Template {
    type Err = TigoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "server" => Ok(Template::Server),
            other => Err(TigoError::InvalidConfig(format!(
                "unknown template '{other}', available templates: server"
            ))),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Server => f.write_str("server"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub package: PackageInfo,
    pub files: usize,
    /// Set when `npm install` failed. The template files are in place.
    pub install_error: Option<String>,
}

/// Download (or reuse) the latest server template, unpack it into `dest` and
/// install its dependencies.
pub fn init_server(
    dest: &Path,
    temp_dir: &Path,
    registry: &Registry,
    pm: &dyn PackageManager,
) -> Result<InitOutcome> {
    let info = registry.latest(SERVER_PACKAGE)?;
    tracing::info!("server package {} found", info.version);
    let tarball = pack::fetch(registry, &info, temp_dir, SERVER_CACHE_PREFIX)?;
    let files = pack::extract(&tarball, dest)?;

    tracing::info!("package extracted, installing dependencies");
    let install_error = match pm.install(dest, &[]) {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!("cannot install the dependencies of tigo server: {e}");
            Some(e.to_string())
        }
    };
    Ok(InitOutcome {
        package: info,
        files,
        install_error,
    })
}
