//! Backing columnar store.
//!
//! The [`BackingStore`] trait is the seam between the table sink and
//! whatever physically holds the rows. Column creation and row appends are
//! async suspension points; the sink awaits them one at a time so a record's
//! schema changes always land before its row.
//!
//! [`ArrowStore`] is the built-in implementation: one Arrow builder per
//! column, exported as a single Parquet file on finalize. Values reaching it
//! are converted with the native rules in [`cast`].

pub mod cast;
mod columnar;

pub use cast::{Cell, cast};
pub use columnar::ArrowStore;

use crate::error::Result;
use crate::schema::Column;
use crate::value::Value;
use async_trait::async_trait;
use std::path::Path;

/// Storage backend owned by a [`TableSink`](crate::sink::TableSink).
#[async_trait]
pub trait BackingStore: Send {
    /// Allocate the table with only the envelope column.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be initialized; this is fatal to the stream.
    async fn open(&mut self, envelope: &Column) -> Result<()>;

    /// Add a column; existing rows read as null in it.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::ColumnRejected`](crate::ExportError::ColumnRejected)
    /// if the column cannot be created.
    async fn add_column(&mut self, column: &Column) -> Result<()>;

    /// Append one row holding exactly one value per column, in column order.
    ///
    /// Appends are atomic: if any value cannot be converted, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Coercion`](crate::ExportError::Coercion) or
    /// [`ExportError::RowWidth`](crate::ExportError::RowWidth) when the row is refused.
    async fn append_row(&mut self, row: Vec<Value>) -> Result<()>;

    /// Number of rows held.
    fn row_count(&self) -> usize;

    /// Flush every row into an artifact at `path`; returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written.
    async fn export(&mut self, path: &Path) -> Result<usize>;

    /// Release the store. Further calls fail with
    /// [`ExportError::Uninitialized`](crate::ExportError::Uninitialized).
    ///
    /// # Errors
    ///
    /// Returns an error if resources cannot be released cleanly.
    async fn close(&mut self) -> Result<()>;
}
