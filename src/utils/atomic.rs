//! Atomic file operations
//!
//! Whole-file writes that a concurrent reader observes either completely or
//! not at all.
//!
//! # Pattern
//!
//! 1. Take the exclusive lock for the target path (bounded wait)
//! 2. Write to a sibling temporary file (`.<name>.<pid>.<token>.tmp`) that no
//!    other writer, in this process or another, can open
//! 3. Call sync_all() to flush to disk
//! 4. Rename temp file to final path (atomic on most filesystems)
//!
//! On failure the temp file is removed and the previous content stays intact.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs4::fs_std::FileExt;
use uuid::Uuid;

use super::lock::{lock_path_for, LockTable, PathLock};

/// Result type for atomic operations
pub type AtomicResult<T> = Result<T, AtomicError>;

/// Errors that can occur during atomic operations
#[derive(Debug, thiserror::Error)]
pub enum AtomicError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("lock on {} not acquired within {waited:?}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },
}

/// Fresh temp file name for one write replacing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let token = Uuid::new_v4().simple().to_string();
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), &token[..8]))
}

/// Atomically write content to a file under its path lock
///
/// # Example
///
/// ```ignore
/// atomic_write(&locks, "data/events.json", b"[]")?;
/// ```
pub fn atomic_write<P: AsRef<Path>>(locks: &Arc<LockTable>, path: P, content: &[u8]) -> AtomicResult<()> {
    let path = path.as_ref();
    let guard = locks.acquire(path)?;
    write_locked(&guard, content)
}

/// Replace the file named by an already-held lock
///
/// Used by read-modify-write sequences that keep the lock across the read.
pub fn write_locked(guard: &PathLock, content: &[u8]) -> AtomicResult<()> {
    let path = guard.key();
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let result = write_and_rename(&temp_path, path, content);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_and_rename(temp_path: &Path, path: &Path, content: &[u8]) -> AtomicResult<()> {
    let mut file = File::options().write(true).create_new(true).open(temp_path)?;
    file.write_all(content)?;

    // Sync to disk (ensure data is durable)
    file.sync_all()?;
    drop(file);

    fs::rename(temp_path, path)?;
    Ok(())
}

/// Clean up any leftover temp files from interrupted writes
///
/// Walks `dir` recursively. Call this on startup before serving requests.
/// A temp file whose target is locked by a live writer is left alone.
pub fn cleanup_temp_files<P: AsRef<Path>>(dir: P) -> AtomicResult<usize> {
    let dir = dir.as_ref();
    let mut cleaned = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_dir() {
            cleaned += cleanup_temp_files(&path)?;
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') && name.ends_with(".tmp") && !write_in_progress(dir, &name) {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}

/// Whether the sidecar lock of the temp file's target is held right now
fn write_in_progress(dir: &Path, temp_name: &str) -> bool {
    let target = temp_name
        .strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(".tmp"))
        .and_then(|rest| rest.rsplitn(3, '.').nth(2));
    let Some(target) = target else {
        return false;
    };

    match File::open(lock_path_for(&dir.join(target))) {
        Ok(file) => matches!(FileExt::try_lock_exclusive(&file), Ok(false)),
        Err(_) => false,
    }
}
