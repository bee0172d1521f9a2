//! Minimal npm registry client: latest-version metadata and tarball
//! downloads.

use crate::error::{Result, TigoError};
use crate::io;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";
pub const REGISTRY_ENV: &str = "TIGO_REGISTRY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const USER_AGENT: &str = concat!("tigo-cli/", env!("CARGO_PKG_VERSION"));

/// The `dist` block of a registry version document.
#[derive(Debug, Clone, Deserialize)]
pub struct Dist {
    pub tarball: String,
    #[serde(default)]
    pub shasum: Option<String>,
    #[serde(default)]
    pub integrity: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub dist: Dist,
}

pub struct Registry {
    base: String,
    client: reqwest::blocking::Client,
}

impl Registry {
    pub fn new(base: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Registry at `$TIGO_REGISTRY`, or the public npm registry.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var(REGISTRY_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGISTRY.to_string());
        Self::new(&base)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Metadata of the `latest` dist-tag of `name`.
    pub fn latest(&self, name: &str) -> Result<PackageInfo> {
        let url = format!("{}/{}/latest", self.base, escape_name(name));
        tracing::debug!(%url, "fetching package info");
        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TigoError::PackageNotFound(name.to_string()));
        }
        if !status.is_success() {
            return Err(TigoError::Registry(format!("{url} returned HTTP {status}")));
        }
        resp.json::<PackageInfo>()
            .map_err(|e| TigoError::Registry(format!("invalid package info for {name}: {e}")))
    }

    /// Download `url` to `dest`, replacing it atomically.
    pub fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::debug!(%url, dest = %dest.display(), "downloading");
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TigoError::Registry(format!(
                "download of {url} failed with HTTP {status}"
            )));
        }
        let bytes = resp.bytes()?;
        io::atomic_write(dest, &bytes)
    }
}

/// Scoped names keep their `@` but escape the separator, as npm does.
fn escape_name(name: &str) -> String {
    if name.starts_with('@') {
        name.replacen('/', "%2f", 1)
    } else {
        name.to_string()
    }
}
