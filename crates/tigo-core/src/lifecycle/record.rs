use crate::error::Result;
use crate::lifecycle::Backend;
use crate::process;
use crate::store::JsonStore;
use serde_json::Value;

pub const LAST_RUN_TYPE: &str = "lastRunType";
pub const LAST_RUN_PID: &str = "lastRunPid";

/// How the server was last launched, as kept in the per-user store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessRecord {
    pub backend: Option<Backend>,
    pub pid: Option<u32>,
}

impl ProcessRecord {
    pub fn read(store: &JsonStore) -> Self {
        let backend = store.get_str(LAST_RUN_TYPE).and_then(|s| s.parse().ok());
        let pid = store
            .get_u64(LAST_RUN_PID)
            .and_then(|p| u32::try_from(p).ok())
            .filter(|p| *p > 0);
        Self { backend, pid }
    }

    /// The recorded pid if that process is still alive.
    pub fn live_pid(&self) -> Option<u32> {
        self.pid.filter(|pid| process::is_alive(*pid))
    }

    /// Record a successful supervisor start. No pid is tracked for pm2.
    pub fn record_supervised(store: &mut JsonStore) -> Result<()> {
        store.remove(&[LAST_RUN_PID])?;
        store.set(LAST_RUN_TYPE, Value::String(Backend::Pm2.to_string()))
    }

    /// Record a successful direct start.
    pub fn record_direct(store: &mut JsonStore, pid: u32) -> Result<()> {
        store.set(LAST_RUN_PID, Value::from(pid))?;
        store.set(LAST_RUN_TYPE, Value::String(Backend::Directly.to_string()))
    }

    pub fn clear_pid(store: &mut JsonStore) -> Result<()> {
        store.remove(&[LAST_RUN_PID])
    }

    pub fn clear(store: &mut JsonStore) -> Result<()> {
        store.remove(&[LAST_RUN_PID, LAST_RUN_TYPE])
    }
}
