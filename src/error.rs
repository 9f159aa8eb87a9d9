//! Error types for the export engine.
//!
//! Provides [`ExportError`] for every fallible step between a decoded record
//! and the finished Parquet artifact, plus a convenience [`Result`] alias.

use thiserror::Error;

/// Result alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while building or finalizing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The backing store was never opened, or has already been finalized.
    #[error("backing store not initialized")]
    Uninitialized,

    /// `start` was called on a sink that is already open or finalized.
    #[error("backing store already started")]
    AlreadyStarted,

    /// A payload field could not be added as a column.
    #[error("cannot add column '{column}': {reason}")]
    ColumnRejected {
        /// The payload field name.
        column: String,
        /// Why the column was refused.
        reason: String,
    },

    /// A value could not be stored in its column's fixed type.
    #[error("cannot store value in column '{column}': {message}")]
    Coercion {
        /// The column the value was destined for.
        column: String,
        /// What went wrong during conversion.
        message: String,
    },

    /// A row did not carry exactly one cell per column.
    #[error("row has {actual} cells but the table has {expected} columns")]
    RowWidth {
        /// Number of columns in the table.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },

    /// An Arrow error raised while building the record batch.
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A Parquet error raised while writing the artifact.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking export task panicked or was cancelled.
    #[error("export task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ExportError {
    /// Returns `true` for errors that mean the store cannot accept writes at all.
    ///
    /// Every other error is scoped to a single record or column and the stream
    /// keeps going.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::AlreadyStarted)
    }
}
