use crate::error::{Result, TigoError};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_INTERNAL_BASE: &str = "/api";
pub const READINESS_PATH: &str = "/common/checkAvailable";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterBase {
    #[serde(default)]
    pub base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub internal: Option<RouterBase>,
}

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

/// Typed, read-only view over the parts of a runtime config document the CLI
/// itself relies on. Every other section (`static`, `dev`, `plugins`,
/// `framework`, ...) belongs to the server and is not inspected here.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub router: Option<RouterConfig>,
}

impl RuntimeConfig {
    pub fn from_document(doc: &Value) -> Result<Self> {
        let cfg: RuntimeConfig = serde_json::from_value(doc.clone())
            .map_err(|e| TigoError::InvalidConfig(e.to_string()))?;
        if cfg.server.port == 0 {
            return Err(TigoError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }
        Ok(cfg)
    }

    /// Route prefix for internal endpoints (`router.internal.base`).
    pub fn internal_base(&self) -> &str {
        self.router
            .as_ref()
            .and_then(|r| r.internal.as_ref())
            .and_then(|b| b.base.as_deref())
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_INTERNAL_BASE)
    }

    /// URL polled after a direct start to confirm the server is serving.
    pub fn readiness_url(&self) -> String {
        format!(
            "http://127.0.0.1:{}{}{}",
            self.server.port,
            self.internal_base().trim_end_matches('/'),
            READINESS_PATH
        )
    }
}
