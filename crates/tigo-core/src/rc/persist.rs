use crate::error::{Result, TigoError};
use crate::io;
use crate::rc::js;
use crate::rc::locator::{RcFormat, RcStatus};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Whether [`persist`] may create a config file that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Only write over an existing representation.
    Existing,
    /// Create `.tigorc.json` when no representation exists.
    Create,
}

/// Read the authoritative representation. `None` when neither file exists.
pub fn load(status: &RcStatus) -> Result<Option<Value>> {
    let Some(format) = status.authoritative() else {
        return Ok(None);
    };
    let path = status.path_of(format);
    let content = std::fs::read_to_string(path)?;
    let doc = match format {
        RcFormat::Json => serde_json::from_str(&content)
            .map_err(|e| TigoError::InvalidConfig(format!("{}: {e}", path.display())))?,
        RcFormat::Js => js::parse_module(&content)?,
    };
    if !doc.is_object() {
        return Err(TigoError::InvalidConfig(format!(
            "{}: top level must be a mapping",
            path.display()
        )));
    }
    Ok(Some(doc))
}

/// Serialize `doc` to the representation `status` marks as authoritative.
///
/// JSON is written when it exists (removing a stale `.tigorc.js` beside it)
/// or when nothing exists and `mode` is [`WriteMode::Create`]. A JS-only
/// project keeps its `.tigorc.js`.
pub fn persist(status: &RcStatus, doc: &Value, mode: WriteMode) -> Result<PathBuf> {
    let format = match status.authoritative() {
        Some(format) => format,
        None if mode == WriteMode::Create => RcFormat::Json,
        None => {
            return Err(TigoError::Persistence(format!(
                "{} does not exist",
                status.json.path.display()
            )))
        }
    };
    let path = status.path_of(format).to_path_buf();
    let content = match format {
        RcFormat::Json => io::to_pretty_json(doc)?,
        RcFormat::Js => js::render_module(doc),
    };
    write(&path, &content)?;
    if format == RcFormat::Json && status.js.exists {
        remove_stale(&status.js.path)?;
    }
    tracing::debug!(path = %path.display(), "runtime config written");
    Ok(path)
}

/// Always write `.tigorc.json`, converting a JS config if there is one.
pub fn persist_json(status: &RcStatus, doc: &Value) -> Result<PathBuf> {
    let path = status.json.path.clone();
    write(&path, &io::to_pretty_json(doc)?)?;
    if status.js.exists {
        remove_stale(&status.js.path)?;
    }
    Ok(path)
}

/// Load a `.tigodev` document.
pub fn load_dev(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&content)
        .map_err(|e| TigoError::InvalidConfig(format!("{}: {e}", path.display())))?;
    if !doc.is_object() {
        return Err(TigoError::InvalidConfig(format!(
            "{}: top level must be a mapping",
            path.display()
        )));
    }
    Ok(doc)
}

/// Write a `.tigodev` document back in place.
pub fn persist_dev(path: &Path, doc: &Value) -> Result<()> {
    write(path, &io::to_pretty_json(doc)?)
}

fn write(path: &Path, content: &str) -> Result<()> {
    io::atomic_write(path, content.as_bytes())
        .map_err(|e| TigoError::Persistence(format!("{}: {e}", path.display())))
}

fn remove_stale(path: &Path) -> Result<()> {
    std::fs::remove_file(path).map_err(|e| {
        TigoError::Persistence(format!("cannot remove {}: {e}", path.display()))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
