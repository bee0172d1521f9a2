use thiserror::Error;

#[derive(Debug, Error)]
pub enum TigoError {
    #[error("the configuration item does not exist: {0}")]
    KeyNotFound(String),

    #[error("invalid configuration key '{0}'")]
    InvalidKey(String),

    #[error("'{0}' is not a mapping and cannot hold nested keys")]
    NotAMapping(String),

    #[error("cannot find .tigorc or .tigodev in {0}")]
    ConfigNotFound(String),

    #[error("invalid runtime config: {0}")]
    InvalidConfig(String),

    #[error("cannot write runtime config: {0}")]
    Persistence(String),

    #[error("cannot get response from server in {attempts} tries")]
    StartupTimeout { attempts: u32 },

    #[error("process manager '{0}' is not available")]
    BackendUnavailable(String),

    #[error("no process with pid {0} is running")]
    ProcessNotFound(u32),

    #[error("cannot locate the tigo server in {0}")]
    ServerNotFound(String),

    #[error("cannot find the pm2 ecosystem config at {0}")]
    SupervisorConfigMissing(String),

    #[error("failed to start server: {0}")]
    StartFailed(String),

    #[error("failed to stop server: {0}")]
    StopFailed(String),

    #[error("package not found in registry: {0}")]
    PackageNotFound(String),

    #[error("module '{0}' is not installed on the server")]
    PluginNotInstalled(String),

    #[error("registry request failed: {0}")]
    Registry(String),

    #[error("'{command}' failed: {message}")]
    PackageManager { command: String, message: String },

    #[error("package hash mismatch for {0}")]
    IntegrityMismatch(String),

    #[error("{0}")]
    Environment(String),

    #[error("home directory not found: set HOME or TIGO_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl TigoError {
    /// Process exit code for this failure category.
    pub fn exit_code(&self) -> i32 {
        match self {
            TigoError::KeyNotFound(_) | TigoError::InvalidKey(_) | TigoError::NotAMapping(_) => -2,
            TigoError::ConfigNotFound(_) | TigoError::InvalidConfig(_) => -3,
            TigoError::Persistence(_) => -4,
            TigoError::StartupTimeout { .. } => -5,
            TigoError::StartFailed(_)
            | TigoError::BackendUnavailable(_)
            | TigoError::SupervisorConfigMissing(_) => -6,
            TigoError::StopFailed(_) | TigoError::ProcessNotFound(_) => -7,
            TigoError::ServerNotFound(_) => -8,
            TigoError::PackageNotFound(_)
            | TigoError::PluginNotInstalled(_)
            | TigoError::Registry(_)
            | TigoError::Http(_) => -9,
            TigoError::PackageManager { .. } => -10,
            TigoError::IntegrityMismatch(_) => -11,
            TigoError::Environment(_) | TigoError::HomeNotFound => -12,
            TigoError::Io(_) | TigoError::Json(_) => -1,
        }
    }
}

pub type Result<T> = std::result::Result<T, TigoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_have_distinct_codes() {
        let codes = [
            TigoError::KeyNotFound("a".into()).exit_code(),
            TigoError::ConfigNotFound(".".into()).exit_code(),
            TigoError::Persistence("x".into()).exit_code(),
            TigoError::StartupTimeout { attempts: 10 }.exit_code(),
            TigoError::StartFailed("x".into()).exit_code(),
            TigoError::StopFailed("x".into()).exit_code(),
            TigoError::ServerNotFound(".".into()).exit_code(),
            TigoError::Registry("x".into()).exit_code(),
            TigoError::PackageManager {
                command: "npm".into(),
                message: "x".into(),
            }
            .exit_code(),
            TigoError::IntegrityMismatch("x".into()).exit_code(),
            TigoError::HomeNotFound.exit_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
        assert!(codes.iter().all(|c| *c < 0));
    }
}
