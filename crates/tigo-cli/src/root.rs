use std::path::{Path, PathBuf};

/// Resolve the project directory a command works on.
///
/// Priority:
/// 1. `--dir` flag / `TIGO_WORKDIR` env var (passed in as `explicit`),
///    resolved against the current directory when relative
/// 2. The current directory
pub fn resolve_work_dir(explicit: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_dir_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_work_dir(Some(dir.path())), dir.path());
    }

    #[test]
    fn relative_dir_is_joined_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve_work_dir(Some(Path::new("site"))), cwd.join("site"));
        assert_eq!(resolve_work_dir(None), cwd);
    }
}
