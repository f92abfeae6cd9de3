use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};

/// Highest backup index tried before giving up.
pub const MAX_BACKUP_INDEX: usize = 1000;

/// First free `<name>.<N>.bak` next to `path`, scanning `N` up from 0.
pub fn backup_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::TypeKind(format!("{} has no file name", path.display())))?
        .to_string_lossy()
        .into_owned();
    let dir = path.parent().unwrap_or_else(|| Path::new(""));

    (0..=MAX_BACKUP_INDEX)
        .map(|n| dir.join(format!("{}.{}.bak", name, n)))
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| Error::TooManyBackups {
            path: path.to_path_buf(),
            checked: MAX_BACKUP_INDEX + 1,
        })
}

/// Moves an existing `path` aside to its first free backup name.
///
/// Returns the backup location, or `None` when there was nothing to move.
pub fn rotate(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = backup_path(path)?;
    info!("Copy {} to {}", path.display(), backup.display());
    fs::rename(path, &backup)?;
    Ok(Some(backup))
}
