//! Advisory path locks with bounded waits
//!
//! Locks are keyed by path. Threads of this process queue on the table; a
//! cross-process table additionally holds an exclusive `flock` on a sidecar
//! `.<name>.lock` file next to the key, so other processes sharing the data
//! directory are excluded too. Readers never consult the table.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fs4::fs_std::FileExt;
use parking_lot::{Condvar, Mutex};

use super::atomic::{AtomicError, AtomicResult};

/// Interval between attempts on a sidecar lock held by another process
const FILE_LOCK_POLL: Duration = Duration::from_millis(5);

/// Table of currently held path locks
#[derive(Debug)]
pub struct LockTable {
    held: Mutex<HashSet<PathBuf>>,
    released: Condvar,
    timeout: Duration,
    file_locks: bool,
}

impl LockTable {
    /// Create an in-process lock table whose acquisitions give up after `timeout`
    pub fn new(timeout: Duration) -> Arc<Self> {
        Self::build(timeout, false)
    }

    /// Like `new`, but every lock also holds the key's sidecar file lock
    pub fn cross_process(timeout: Duration) -> Arc<Self> {
        Self::build(timeout, true)
    }

    fn build(timeout: Duration, file_locks: bool) -> Arc<Self> {
        Arc::new(Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
            file_locks,
        })
    }

    /// Acquire the exclusive lock for `key`, waiting at most the table timeout
    pub fn acquire<P: AsRef<Path>>(self: &Arc<Self>, key: P) -> AtomicResult<PathLock> {
        let key = key.as_ref().to_path_buf();
        let started = Instant::now();
        let deadline = started + self.timeout;

        let mut held = self.held.lock();
        while held.contains(&key) {
            if self.released.wait_until(&mut held, deadline).timed_out() && held.contains(&key) {
                return Err(AtomicError::LockTimeout {
                    path: key,
                    waited: started.elapsed(),
                });
            }
        }
        held.insert(key.clone());
        drop(held);

        // From here on the guard owns the slot, so an early return frees it
        let mut lock = PathLock {
            table: Arc::clone(self),
            key,
            file: None,
        };
        if self.file_locks {
            lock.file = Some(lock_sidecar(&lock.key, started, deadline)?);
        }
        Ok(lock)
    }

    /// Acquire several keys in a stable order so two callers never deadlock
    pub fn acquire_many<P: AsRef<Path>>(self: &Arc<Self>, keys: &[P]) -> AtomicResult<Vec<PathLock>> {
        let mut sorted: Vec<PathBuf> = keys.iter().map(|k| k.as_ref().to_path_buf()).collect();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            guards.push(self.acquire(key)?);
        }
        Ok(guards)
    }

    /// Whether `key` is currently held by anyone
    pub fn is_held<P: AsRef<Path>>(&self, key: P) -> bool {
        self.held.lock().contains(key.as_ref())
    }
}

/// Sidecar lock file for `key`, e.g. `events.json` -> `.events.json.lock`
pub fn lock_path_for(key: &Path) -> PathBuf {
    let name = key
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    key.with_file_name(format!(".{}.lock", name))
}

fn lock_sidecar(key: &Path, started: Instant, deadline: Instant) -> AtomicResult<File> {
    let path = lock_path_for(key);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;

    loop {
        if FileExt::try_lock_exclusive(&file)? {
            return Ok(file);
        }
        if Instant::now() >= deadline {
            return Err(AtomicError::LockTimeout {
                path: key.to_path_buf(),
                waited: started.elapsed(),
            });
        }
        thread::sleep(FILE_LOCK_POLL);
    }
}

/// Held lock; released on drop, on every exit path
#[derive(Debug)]
pub struct PathLock {
    table: Arc<LockTable>,
    key: PathBuf,
    file: Option<File>,
}

impl PathLock {
    pub fn key(&self) -> &Path {
        &self.key
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        // Closing the sidecar releases the file lock before waiters wake
        drop(self.file.take());
        self.table.held.lock().remove(&self.key);
        self.table.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_lock_released_on_drop() {
        let table = LockTable::new(Duration::from_millis(50));
        {
            let _guard = table.acquire("a.json").unwrap();
            assert!(table.is_held("a.json"));
        }
        assert!(!table.is_held("a.json"));
        assert!(table.acquire("a.json").is_ok());
    }

    #[test]
    fn test_contended_lock_times_out() {
        let table = LockTable::new(Duration::from_millis(30));
        let _guard = table.acquire("a.json").unwrap();

        match table.acquire("a.json") {
            Err(AtomicError::LockTimeout { path, .. }) => assert_eq!(path, PathBuf::from("a.json")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let table = LockTable::new(Duration::from_millis(30));
        let _a = table.acquire("a.json").unwrap();
        assert!(table.acquire("b.json").is_ok());
    }

    #[test]
    fn test_waiter_proceeds_after_release() {
        let table = LockTable::new(Duration::from_secs(5));
        let guard = table.acquire("shared").unwrap();

        let waiter = {
            let table = Arc::clone(&table);
            thread::spawn(move || table.acquire("shared").map(|_| ()))
        };

        thread::sleep(Duration::from_millis(20));
        drop(guard);
        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn test_acquire_many_dedups_keys() {
        let table = LockTable::new(Duration::from_millis(30));
        let guards = table.acquire_many(&["b", "a", "b"]).unwrap();
        assert_eq!(guards.len(), 2);
        assert_eq!(guards[0].key(), Path::new("a"));
    }

    #[test]
    fn test_sidecar_lock_excludes_other_tables() {
        let dir = tempfile::TempDir::new().unwrap();
        let key = dir.path().join("events.json");

        // Two tables stand in for two processes sharing the directory
        let first = LockTable::cross_process(Duration::from_secs(5));
        let second = LockTable::cross_process(Duration::from_millis(40));

        let guard = first.acquire(&key).unwrap();
        assert!(lock_path_for(&key).is_file());
        match second.acquire(&key) {
            Err(AtomicError::LockTimeout { path, .. }) => assert_eq!(path, key),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(!second.is_held(&key));

        drop(guard);
        assert!(second.acquire(&key).is_ok());
    }

    #[test]
    fn test_sidecar_waiter_proceeds_after_release() {
        let dir = tempfile::TempDir::new().unwrap();
        let key = dir.path().join(".locks").join("demo");
        let first = LockTable::cross_process(Duration::from_secs(5));
        let second = LockTable::cross_process(Duration::from_secs(5));

        let guard = first.acquire(&key).unwrap();
        let waiter = {
            let key = key.clone();
            thread::spawn(move || second.acquire(&key).map(|_| ()))
        };

        thread::sleep(Duration::from_millis(20));
        drop(guard);
        assert!(waiter.join().unwrap().is_ok());
    }
}
