//! Low-level JSON file helpers shared by the store modules.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Suffix appended to a data file that could not be read back.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// Read a file to a string. A missing file is `Ok(None)`.
pub fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// The data is written to a temporary file in the same directory and then
/// renamed over the target, so readers never observe a half-written file.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n").map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Load a JSON document, falling back to `default` when the file is
/// missing, unreadable or malformed. Problems are logged, never returned.
pub fn load_or_default<T, F>(path: &Path, default: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match read_optional(path) {
        Ok(Some(content)) => match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring malformed {}: {}", path.display(), e);
                default()
            }
        },
        Ok(None) => {
            debug!("{} not found, using defaults", path.display());
            default()
        }
        Err(e) => {
            warn!("{}", e);
            default()
        }
    }
}

/// Path a damaged data file is copied to before it gets overwritten.
pub fn corrupt_copy_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(CORRUPT_SUFFIX);
    path.with_file_name(name)
}

/// Copy a damaged file aside so the next save does not destroy it.
///
/// Earlier backups are never overwritten: the copy goes to the first free
/// name among `<file>.corrupt`, `<file>.corrupt.1`, `<file>.corrupt.2`, ...
/// A backup that already holds the same bytes is reused.
pub fn set_aside(path: &Path) -> Option<PathBuf> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not back up {}: {}", path.display(), e);
            return None;
        }
    };

    let first = corrupt_copy_path(path);
    for n in 0usize.. {
        let target = if n == 0 {
            first.clone()
        } else {
            let mut name = first.clone().into_os_string();
            name.push(format!(".{n}"));
            PathBuf::from(name)
        };

        match fs::read(&target) {
            Ok(existing) if existing == content => {
                debug!("{} already backed up at {}", path.display(), target.display());
                return Some(target);
            }
            Ok(_) => continue,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return match fs::write(&target, &content) {
                    Ok(()) => {
                        warn!("Copied unreadable data to {}", target.display());
                        Some(target)
                    }
                    Err(e) => {
                        warn!("Could not back up {}: {}", path.display(), e);
                        None
                    }
                };
            }
            Err(e) => {
                warn!("Could not back up {}: {}", path.display(), e);
                return None;
            }
        }
    }
    None
}
