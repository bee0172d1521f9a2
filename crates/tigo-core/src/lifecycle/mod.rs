//! Server lifecycle: start, stop and restart a tigo server with either pm2
//! or a directly spawned `node` process.
//!
//! ```text
//! Stopped --start--> Starting(b) --ok--> Running(b)
//!                        |  \--pm2 fails--> Starting(directly)
//!                        \--timeout/error--> Stopped
//! Running(b) --stop--> Stopping(b) --ok--> Stopped
//! ```

pub mod direct;
pub mod pm2;
pub mod record;

pub use direct::{Launcher, NodeLauncher};
pub use pm2::{Pm2, Supervisor};
pub use record::ProcessRecord;

use crate::error::{Result, TigoError};
use crate::health::ReadinessProbe;
use crate::paths;
use crate::process;
use crate::rc::{OpenRc, RuntimeConfig};
use crate::store::JsonStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// How long `stop` waits for a signalled server to go away.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Pm2,
    Directly,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Pm2 => "pm2",
            Backend::Directly => "directly",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = TigoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pm2" => Ok(Backend::Pm2),
            "directly" | "direct" => Ok(Backend::Directly),
            other => Err(TigoError::InvalidConfig(format!(
                "unknown start type '{other}', expected 'pm2' or 'directly'"
            ))),
        }
    }
}

/// Pick the backend for a start.
///
/// An explicit `--directly` wins, then the configured default start type,
/// then a cached "pm2 is installed" flag, then a live lookup of pm2.
pub fn select_backend(
    directly: bool,
    configured: Option<Backend>,
    pm2_cached: bool,
    detect_pm2: impl FnOnce() -> bool,
) -> Backend {
    if directly {
        return Backend::Directly;
    }
    if let Some(b) = configured {
        return b;
    }
    if pm2_cached || detect_pm2() {
        Backend::Pm2
    } else {
        Backend::Directly
    }
}

// ---------------------------------------------------------------------------
// State and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting(Backend),
    Running { backend: Backend, pid: Option<u32> },
    Stopping(Backend),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A directly started server from an earlier run is still alive.
    AlreadyRunning { pid: u32 },
    Started {
        backend: Backend,
        pid: Option<u32>,
        /// pm2 was requested but failed, and the server was started directly.
        fell_back: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing has been started through the CLI.
    NoRecord,
    /// A direct start was recorded without a pid. The record is cleared.
    MissingPid,
    /// The recorded process had already exited. The record is cleared.
    AlreadyGone { pid: u32 },
    /// pm2 was recorded but its ecosystem config is gone, so the app cannot
    /// be named. Only reported while restarting.
    SupervisorConfigMissing { path: String },
    Stopped { backend: Backend },
}

/// Result of the stop half of a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPlan {
    pub stop: Option<StopOutcome>,
    /// Backend to start the server with again.
    pub backend: Backend,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives one server directory through its lifecycle, keeping the process
/// record in the per-user store in sync.
pub struct Controller<'s> {
    server_dir: PathBuf,
    store: &'s mut JsonStore,
    supervisor: Box<dyn Supervisor>,
    launcher: Box<dyn Launcher>,
    probe: Box<dyn ReadinessProbe>,
    stop_timeout: Duration,
    state: LifecycleState,
}

impl<'s> Controller<'s> {
    pub fn new(
        server_dir: &Path,
        store: &'s mut JsonStore,
        supervisor: Box<dyn Supervisor>,
        launcher: Box<dyn Launcher>,
        probe: Box<dyn ReadinessProbe>,
    ) -> Self {
        let record = ProcessRecord::read(store);
        let state = match record.backend {
            Some(Backend::Pm2) => LifecycleState::Running {
                backend: Backend::Pm2,
                pid: None,
            },
            Some(Backend::Directly) => match record.live_pid() {
                Some(pid) => LifecycleState::Running {
                    backend: Backend::Directly,
                    pid: Some(pid),
                },
                None => LifecycleState::Stopped,
            },
            None => LifecycleState::Stopped,
        };
        Self {
            server_dir: server_dir.to_path_buf(),
            store,
            supervisor,
            launcher,
            probe,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            state,
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!(from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
    }

    pub fn start(&mut self, backend: Backend) -> Result<StartOutcome> {
        match backend {
            Backend::Directly => self.start_directly(false),
            Backend::Pm2 => self.start_supervised(),
        }
    }

    fn start_supervised(&mut self) -> Result<StartOutcome> {
        self.transition(LifecycleState::Starting(Backend::Pm2));
        match self.supervisor.start(&self.server_dir) {
            Ok(()) => {
                ProcessRecord::record_supervised(self.store)?;
                self.transition(LifecycleState::Running {
                    backend: Backend::Pm2,
                    pid: None,
                });
                Ok(StartOutcome::Started {
                    backend: Backend::Pm2,
                    pid: None,
                    fell_back: false,
                })
            }
            Err(e @ TigoError::SupervisorConfigMissing(_)) => {
                self.transition(LifecycleState::Stopped);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    "cannot start server with {} ({e}), trying to start it directly",
                    self.supervisor.name()
                );
                self.start_directly(true)
            }
        }
    }

    fn start_directly(&mut self, fell_back: bool) -> Result<StartOutcome> {
        let record = ProcessRecord::read(self.store);
        if let Some(pid) = record.live_pid() {
            self.transition(LifecycleState::Running {
                backend: Backend::Directly,
                pid: Some(pid),
            });
            return Ok(StartOutcome::AlreadyRunning { pid });
        }
        if record.pid.is_some() {
            ProcessRecord::clear_pid(self.store)?;
        }

        let doc = OpenRc::open_runtime(&self.server_dir)?.doc;
        let rc = RuntimeConfig::from_document(&doc)?;
        let entry = paths::server_main_path(&self.server_dir);
        if !entry.is_file() {
            self.transition(LifecycleState::Stopped);
            return Err(TigoError::StartFailed(
                "cannot locate the main file of tigo server".to_string(),
            ));
        }

        self.transition(LifecycleState::Starting(Backend::Directly));
        let pid = match self.launcher.launch(&self.server_dir, &entry) {
            Ok(pid) => pid,
            Err(e) => {
                self.transition(LifecycleState::Stopped);
                return Err(e);
            }
        };

        if let Err(e) = self.probe.wait_ready(&rc.readiness_url()) {
            tracing::debug!(pid, "server did not become ready, terminating it");
            match process::terminate(pid) {
                Ok(()) | Err(TigoError::ProcessNotFound(_)) => {}
                Err(kill_err) => tracing::warn!("cannot terminate pid {pid}: {kill_err}"),
            }
            self.transition(LifecycleState::Stopped);
            return Err(e);
        }

        ProcessRecord::record_direct(self.store, pid)?;
        self.transition(LifecycleState::Running {
            backend: Backend::Directly,
            pid: Some(pid),
        });
        Ok(StartOutcome::Started {
            backend: Backend::Directly,
            pid: Some(pid),
            fell_back,
        })
    }

    pub fn stop(&mut self) -> Result<StopOutcome> {
        let record = ProcessRecord::read(self.store);
        let Some(backend) = record.backend else {
            return Ok(StopOutcome::NoRecord);
        };
        let before = self.state;
        self.transition(LifecycleState::Stopping(backend));

        match backend {
            Backend::Pm2 => {
                if let Err(e) = self.supervisor.stop(&self.server_dir) {
                    self.transition(before);
                    return Err(e);
                }
            }
            Backend::Directly => {
                let Some(pid) = record.pid else {
                    ProcessRecord::clear(self.store)?;
                    self.transition(LifecycleState::Stopped);
                    return Ok(StopOutcome::MissingPid);
                };
                if !process::is_alive(pid) {
                    ProcessRecord::clear(self.store)?;
                    self.transition(LifecycleState::Stopped);
                    return Ok(StopOutcome::AlreadyGone { pid });
                }
                match process::terminate(pid) {
                    Ok(()) => {
                        if !process::wait_for_exit(pid, self.stop_timeout) {
                            tracing::warn!(pid, "server is still shutting down");
                        }
                    }
                    Err(TigoError::ProcessNotFound(_)) => {
                        ProcessRecord::clear(self.store)?;
                        self.transition(LifecycleState::Stopped);
                        return Ok(StopOutcome::AlreadyGone { pid });
                    }
                    Err(e) => {
                        self.transition(before);
                        return Err(e);
                    }
                }
            }
        }

        ProcessRecord::clear(self.store)?;
        self.transition(LifecycleState::Stopped);
        Ok(StopOutcome::Stopped { backend })
    }

    /// Stop whatever was last started, if anything, and name the backend to
    /// start again with: the recorded one, or directly when nothing was
    /// recorded. A missing pm2 ecosystem config is reported, not raised.
    pub fn stop_for_restart(&mut self) -> Result<RestartPlan> {
        let record = ProcessRecord::read(self.store);
        let stop = match record.backend {
            None => None,
            Some(_) => match self.stop() {
                Ok(outcome) => Some(outcome),
                Err(TigoError::SupervisorConfigMissing(path)) => {
                    Some(StopOutcome::SupervisorConfigMissing { path })
                }
                Err(e) => return Err(e),
            },
        };
        Ok(RestartPlan {
            stop,
            backend: record.backend.unwrap_or(Backend::Directly),
        })
    }
}
