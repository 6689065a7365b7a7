use std::{fs::{self, File}, io::Write, path::Path};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{CrosswalkError, Result};

/// Create the directory if it doesn't exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(CrosswalkError::Config(format!("path exists but is not a directory: {}", path.display())));
        }
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Write-then-rename: the target either keeps its old contents or receives all of `bytes`.
/// Refuses to replace an existing file unless `force` is set.
pub(crate) fn write_atomic(target: &Path, bytes: &[u8], force: bool) -> Result<()> {
    if target == Path::new("-") {
        return Err(CrosswalkError::Config("stdout is not supported; provide a real file path".into()));
    }
    if !force && target.exists() {
        return Err(CrosswalkError::Config(format!("refusing to overwrite existing file: {} (use --force)", target.display())));
    }

    let parent = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    ensure_dir_exists(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|err| CrosswalkError::Io(err.error))?;

    // Best-effort fsync of the directory entry.
    let _ = File::open(parent).and_then(|dir| dir.sync_all());
    Ok(())
}

/// SHA-256 of a byte buffer, hex encoded.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
