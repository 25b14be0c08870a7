//! Utility functions and helpers
//!
//! Atomic file writes, the path lock table and timestamp helpers.

pub mod atomic;
pub mod lock;
pub mod time;

pub use atomic::{atomic_write, cleanup_temp_files, write_locked, AtomicError, AtomicResult};
pub use lock::{LockTable, PathLock};
pub use time::{file_stamp, parse_schedule_time};
