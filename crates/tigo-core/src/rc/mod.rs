//! Runtime configuration access: locating `.tigorc.json`/`.tigorc.js`
//! (or the `.tigodev` fallback), dotted-path editing, and persistence.

pub mod document;
pub mod js;
pub mod locator;
pub mod model;
pub mod persist;
pub mod plugins;

pub use locator::{RcFormat, RcStatus};
pub use model::RuntimeConfig;
pub use persist::WriteMode;

use crate::error::{Result, TigoError};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where an open config document came from.
#[derive(Debug, Clone)]
pub enum RcSource {
    Runtime(RcStatus),
    Dev(PathBuf),
}

/// A config document read for the duration of one command.
#[derive(Debug, Clone)]
pub struct OpenRc {
    pub source: RcSource,
    pub doc: Value,
}

impl OpenRc {
    /// Open the runtime config in `dir`, falling back to `.tigodev`.
    pub fn open(dir: &Path) -> Result<Self> {
        let status = RcStatus::probe(dir);
        if let Some(doc) = persist::load(&status)? {
            return Ok(Self {
                source: RcSource::Runtime(status),
                doc,
            });
        }
        if let Some(path) = locator::locate_dev(dir) {
            let doc = persist::load_dev(&path)?;
            return Ok(Self {
                source: RcSource::Dev(path),
                doc,
            });
        }
        Err(TigoError::ConfigNotFound(dir.display().to_string()))
    }

    /// Open only the runtime config (no `.tigodev` fallback).
    pub fn open_runtime(dir: &Path) -> Result<Self> {
        let status = RcStatus::probe(dir);
        let doc = persist::load(&status)?
            .ok_or_else(|| TigoError::ConfigNotFound(dir.display().to_string()))?;
        Ok(Self {
            source: RcSource::Runtime(status),
            doc,
        })
    }

    /// Write the document back to where it was read from.
    pub fn save(&self) -> Result<PathBuf> {
        match &self.source {
            RcSource::Runtime(status) => persist::persist(status, &self.doc, WriteMode::Existing),
            RcSource::Dev(path) => {
                persist::persist_dev(path, &self.doc)?;
                Ok(path.clone())
            }
        }
    }

    /// Write the document as `.tigorc.json`, dropping a JS config.
    pub fn save_as_json(&self) -> Result<PathBuf> {
        match &self.source {
            RcSource::Runtime(status) => persist::persist_json(status, &self.doc),
            RcSource::Dev(path) => {
                persist::persist_dev(path, &self.doc)?;
                Ok(path.clone())
            }
        }
    }

    /// Display name of the backing file.
    pub fn file_name(&self) -> &'static str {
        match &self.source {
            RcSource::Runtime(_) => ".tigorc",
            RcSource::Dev(_) => ".tigodev",
        }
    }
}
