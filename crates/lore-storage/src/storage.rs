//! Storage traits and error types.
//!
//! Provides the [`Storage`] and [`Transaction`] traits the spine uses to load
//! raw rows and to read or replace its cached encoding, along with
//! [`StorageError`] for unified error handling across backends.
//!
//! # Transactions
//!
//! Every spine operation receives a [`Transaction`] explicitly. Reads inside a
//! transaction observe its own pending writes; writes become visible to other
//! transactions only after [`Transaction::commit`]. Dropping an uncommitted
//! transaction discards its writes.

use std::path::PathBuf;

use serde_json::Value;

use crate::rows::{PageRow, SectionRow, UnitRow};

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Stored record could not be decoded.
    InvalidRecord,
    /// Backend is temporarily unavailable (connection or lock failure).
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (missing data, invalid record).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
    /// Retry with backoff (service unavailable).
    Persistent,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create an unavailable error, retryable with backoff.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(StorageErrorKind::Unavailable).with_status(ErrorStatus::Persistent)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            _ => StorageErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorStatus::Temporary,
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidRecord => "Invalid record",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// A unit of work against the content store.
///
/// This is the context object every spine operation takes explicitly. It
/// exposes exactly the queries the spine needs: one project, the sections and
/// pages of that project, and the project's cached spine.
pub trait Transaction {
    /// Fetch a project by id.
    ///
    /// Returns `Ok(None)` if the project does not exist.
    fn unit(&self, id: i64) -> Result<Option<UnitRow>, StorageError>;

    /// All sections belonging to `unit`, ascending by id.
    fn sections(&self, unit: i64) -> Result<Vec<SectionRow>, StorageError>;

    /// All pages belonging to `unit`, ascending by id.
    fn pages(&self, unit: i64) -> Result<Vec<PageRow>, StorageError>;

    /// The previously encoded spine stored on `unit`, if any.
    ///
    /// The value is returned as stored; it is the caller's job to validate it.
    fn spine(&self, unit: i64) -> Result<Option<Value>, StorageError>;

    /// Replace the encoded spine stored on `unit`.
    ///
    /// The write is pending until [`commit`](Self::commit).
    fn set_spine(&mut self, unit: i64, spine: Value) -> Result<(), StorageError>;

    /// Apply pending writes.
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// Source of [`Transaction`]s.
///
/// Failing to open a transaction is the only hard failure the spine
/// propagates; everything about the *content* of the store degrades softly.
pub trait Storage: Send + Sync {
    /// Open a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend is unreachable or locked.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StorageError>;
}
