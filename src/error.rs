//! Error taxonomy for store operations
//!
//! Every failure reported by the store maps onto one of five kinds:
//! validation, not-found, conflict, I/O and partial failure. Callers get a
//! structured [`ErrorReport`] (kind + human message) rather than a bare string.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;

use crate::utils::AtomicError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Step of the identifier rename at which a partial failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameStep {
    /// Moving the asset directory, with the document directory rollback also failing
    MoveAssets,
    /// Rewriting asset references inside the configuration document
    RewriteReferences,
    /// Updating the registry entry
    UpdateRegistry,
}

impl fmt::Display for RenameStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameStep::MoveAssets => write!(f, "asset directory move"),
            RenameStep::RewriteReferences => write!(f, "reference rewrite"),
            RenameStep::UpdateRegistry => write!(f, "registry update"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("timed out after {waited_ms}ms waiting for lock on {}", path.display())]
    Lock { path: PathBuf, waited_ms: u128 },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rename '{from}' -> '{to}' stopped during {step} with the store partially changed: {message}")]
    PartialFailure {
        from: String,
        to: String,
        step: RenameStep,
        message: String,
    },
}

/// The five error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "ConflictError")]
    Conflict,
    #[serde(rename = "IOError")]
    Io,
    #[serde(rename = "PartialFailureError")]
    PartialFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::Io => "IOError",
            ErrorKind::PartialFailure => "PartialFailureError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::Io(_) | StoreError::Lock { .. } | StoreError::Json(_) => ErrorKind::Io,
            StoreError::PartialFailure { .. } => ErrorKind::PartialFailure,
        }
    }

    /// Structured form handed back to callers
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<AtomicError> for StoreError {
    fn from(e: AtomicError) -> Self {
        match e {
            AtomicError::Io(e) => StoreError::Io(e),
            AtomicError::LockTimeout { path, waited } => StoreError::Lock {
                path,
                waited_ms: waited.as_millis(),
            },
        }
    }
}

/// Kind + human message, serialised into command and HTTP error bodies
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}
