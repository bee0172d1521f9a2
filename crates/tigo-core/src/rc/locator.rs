use crate::paths;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One on-disk representation of the runtime config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RcFile {
    pub path: PathBuf,
    pub exists: bool,
}

impl RcFile {
    fn probe(path: PathBuf) -> Self {
        let exists = path.is_file();
        Self { path, exists }
    }
}

/// Which representation of the runtime config is read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcFormat {
    Json,
    Js,
}

/// Existence of each runtime config representation in a directory.
///
/// Computed fresh on every call to [`RcStatus::probe`]; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RcStatus {
    pub exists: bool,
    pub json: RcFile,
    pub js: RcFile,
}

impl RcStatus {
    pub fn probe(dir: &Path) -> Self {
        let json = RcFile::probe(paths::rc_json_path(dir));
        let js = RcFile::probe(paths::rc_js_path(dir));
        Self {
            exists: json.exists || js.exists,
            json,
            js,
        }
    }

    /// The representation to read. JSON wins when both exist.
    pub fn authoritative(&self) -> Option<RcFormat> {
        if self.json.exists {
            Some(RcFormat::Json)
        } else if self.js.exists {
            Some(RcFormat::Js)
        } else {
            None
        }
    }

    pub fn path_of(&self, format: RcFormat) -> &Path {
        match format {
            RcFormat::Json => &self.json.path,
            RcFormat::Js => &self.js.path,
        }
    }
}

/// Path of the lambda dev config, if present.
pub fn locate_dev(dir: &Path) -> Option<PathBuf> {
    let path = paths::dev_config_path(dir);
    path.is_file().then_some(path)
}
