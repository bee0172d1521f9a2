use crate::prompt;
use std::path::PathBuf;
use tigo_core::store::JsonStore;
use tigo_core::user_config::UserConfig;
use tigo_core::{env, io, paths, TigoError};

/// Everything a command needs from the environment, built once per
/// invocation.
pub struct AppContext {
    pub work_dir: PathBuf,
    pub tigo_home: PathBuf,
    pub store: JsonStore,
    pub config: UserConfig,
    pub assume_yes: bool,
}

impl AppContext {
    pub fn load(work_dir: PathBuf, assume_yes: bool) -> anyhow::Result<Self> {
        let tigo_home = paths::tigo_home()?;
        io::ensure_dir(&tigo_home)?;
        let store = JsonStore::load(&paths::store_path(&tigo_home))?;
        let config = UserConfig::load(&paths::user_config_path(&tigo_home))?;
        tracing::debug!(
            work_dir = %work_dir.display(),
            home = %tigo_home.display(),
            "context loaded"
        );
        Ok(Self {
            work_dir,
            tigo_home,
            store,
            config,
            assume_yes,
        })
    }

    pub fn temp_dir(&self) -> PathBuf {
        paths::temp_dir(&self.tigo_home)
    }

    /// The server directory: `server_dir` from the CLI config, else the
    /// work dir. It must hold `server.js` and `package.json`.
    pub fn server_dir(&self) -> anyhow::Result<PathBuf> {
        let dir = self
            .config
            .server_dir(&self.work_dir)
            .unwrap_or_else(|| self.work_dir.clone());
        if !paths::is_server_dir(&dir) {
            return Err(TigoError::ServerNotFound(dir.display().to_string()).into());
        }
        Ok(dir)
    }

    pub fn confirm(&self, message: &str, default: bool) -> anyhow::Result<bool> {
        prompt::confirm(message, default, self.assume_yes)
    }

    /// Make sure node and npm are usable.
    pub fn check_env(&mut self) -> anyhow::Result<()> {
        env::check(&mut self.store)?;
        Ok(())
    }
}
