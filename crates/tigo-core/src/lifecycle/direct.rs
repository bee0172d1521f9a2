//! The direct backend: the CLI spawns `node server.js` itself.

use crate::error::{Result, TigoError};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

/// Spawns the server detached and hands back its pid.
pub trait Launcher {
    fn launch(&self, server_dir: &Path, entry: &Path) -> Result<u32>;
}

#[derive(Debug, Default)]
pub struct NodeLauncher;

impl Launcher for NodeLauncher {
    fn launch(&self, server_dir: &Path, entry: &Path) -> Result<u32> {
        let node = which::which("node")
            .map_err(|_| TigoError::StartFailed("node is not installed".to_string()))?;
        tracing::debug!(entry = %entry.display(), "spawning server");
        let child = Command::new(node)
            .arg(entry)
            .current_dir(server_dir)
            .env("NODE_ENV", "prod")
            .env("DB_ENV", "prod")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            // Own process group: the server survives the CLI's terminal.
            .process_group(0)
            .spawn()
            .map_err(|e| TigoError::StartFailed(format!("cannot spawn the server: {e}")))?;
        // Dropping the handle neither waits for nor kills the child; from here
        // on only the pid is tracked.
        Ok(child.id())
    }
}
