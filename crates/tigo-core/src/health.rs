//! Readiness probing for a freshly spawned server.

use crate::error::{Result, TigoError};
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: u32 = 10;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

pub const ATTEMPTS_ENV: &str = "TIGO_PROBE_ATTEMPTS";
pub const DELAY_ENV: &str = "TIGO_PROBE_DELAY_MS";

/// Fixed retry budget: `attempts` tries, each preceded by `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl ProbePolicy {
    /// Defaults, overridable through `TIGO_PROBE_ATTEMPTS` and
    /// `TIGO_PROBE_DELAY_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let attempts = std::env::var(ATTEMPTS_ENV)
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.attempts);
        let delay = std::env::var(DELAY_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.delay);
        Self { attempts, delay }
    }
}

/// Confirms that a server answers on its readiness endpoint.
pub trait ReadinessProbe {
    fn wait_ready(&self, url: &str) -> Result<()>;
}

/// Polls a URL until it returns a 2xx status or the budget runs out.
/// Attempts never overlap: each request completes or times out first.
pub struct HttpProbe {
    policy: ProbePolicy,
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    pub fn new(policy: ProbePolicy) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { policy, client })
    }
}

impl ReadinessProbe for HttpProbe {
    fn wait_ready(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "starting to detect the server status");
        for attempt in 1..=self.policy.attempts {
            std::thread::sleep(self.policy.delay);
            tracing::debug!("try {attempt}: sending ping to server");
            match self.client.get(url).send() {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                Ok(resp) => tracing::debug!(status = %resp.status(), "server not ready"),
                Err(e) => tracing::debug!("server not reachable: {e}"),
            }
        }
        Err(TigoError::StartupTimeout {
            attempts: self.policy.attempts,
        })
    }
}
