//! The table sink: schema evolution and row assembly over a [`BackingStore`].
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --start()--> Open --finalize()--> Finalized
//! ```
//!
//! `append_record` is only accepted while `Open`; in any other state it fails
//! with [`ExportError::Uninitialized`] and writes nothing.
//!
//! ## Per-record flow
//!
//! 1. every payload field without a column is classified from its value in
//!    this record, and the column is added to the store before the row
//! 2. a column the store refuses is logged at debug and the field is dropped;
//!    the name is never retried
//! 3. the row is assembled by column index: envelope JSON at index 0, each
//!    payload value coerced to its column's type, null for absent fields
//! 4. the row is appended atomically; a refused row is counted as skipped

use crate::coerce::coerce;
use crate::error::{ExportError, Result};
use crate::record::Record;
use crate::schema::{Column, ColumnSlot, SchemaRegistry};
use crate::store::{ArrowStore, BackingStore};
use crate::value::Value;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sink state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// `start` has not been called.
    Uninitialized,
    /// Accepting records.
    Open,
    /// The artifact has been written (or attempted) and the store released.
    Finalized,
}

/// Outcome of a finalize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Rows written to the artifact.
    pub rows: usize,
    /// Records refused by the store during the stream.
    pub skipped: usize,
    /// Columns in the artifact, envelope first.
    pub columns: Vec<Column>,
    /// Where the artifact was written.
    pub path: PathBuf,
}

/// Owns the backing store and the schema registry for one export.
#[derive(Debug)]
pub struct TableSink<S: BackingStore = ArrowStore> {
    store: S,
    registry: SchemaRegistry,
    state: SinkState,
    skipped: usize,
}

impl<S: BackingStore> TableSink<S> {
    /// Create a sink over `store` whose envelope column is named `envelope_column`.
    pub fn new(store: S, envelope_column: &str) -> Self {
        Self {
            store,
            registry: SchemaRegistry::new(envelope_column),
            state: SinkState::Uninitialized,
            skipped: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Rows appended so far.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.store.row_count()
    }

    /// Records refused so far.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open the store with only the envelope column.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::AlreadyStarted`] unless the sink is
    /// uninitialized, or whatever the store reports when it cannot open.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != SinkState::Uninitialized {
            return Err(ExportError::AlreadyStarted);
        }
        self.store.open(self.registry.envelope()).await?;
        self.state = SinkState::Open;
        info!(envelope = %self.registry.envelope().name, "table sink open");
        Ok(())
    }

    /// Extend the schema for `record` and append its row.
    ///
    /// # Errors
    ///
    /// - [`ExportError::Uninitialized`] if the sink is not open
    /// - the store's error if the row is refused; the record is counted as
    ///   skipped and the sink stays open
    pub async fn append_record(&mut self, record: &Record) -> Result<()> {
        if self.state != SinkState::Open {
            return Err(ExportError::Uninitialized);
        }

        let fields = record.payload_fields();
        if let Some(fields) = fields {
            for (name, raw) in fields {
                if !self.registry.was_attempted(name) {
                    self.ensure_column(name, &Value::from_json(raw)).await?;
                }
            }
        }

        let mut row = vec![Value::Null; self.registry.len()];
        row[0] = Value::Text(record.envelope_json()?);
        if let Some(fields) = fields {
            for (name, raw) in fields {
                if let Some(index) = self.registry.index_of(name) {
                    let column_type = self.registry.columns()[index].storage_type;
                    row[index] = coerce(Value::from_json(raw), column_type);
                }
            }
        }

        if let Err(e) = self.store.append_row(row).await {
            if !e.is_fatal() {
                self.skipped += 1;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Resolve a column for `name`, creating it if needed.
    ///
    /// Extension failures are logged and swallowed; only a store that is no
    /// longer usable is reported.
    async fn ensure_column(&mut self, name: &str, value: &Value) -> Result<()> {
        let column = match self.registry.ensure_column(name, value) {
            Ok(ColumnSlot::New(column)) => column,
            Ok(ColumnSlot::Existing(_) | ColumnSlot::Dropped) => return Ok(()),
            Err(e) => {
                debug!(column = %name, error = %e, "payload field dropped");
                return Ok(());
            }
        };

        match self.store.add_column(&column).await {
            Ok(()) => {
                info!(column = %column.name, storage_type = %column.storage_type, "column added");
                self.registry.commit(column);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!(column = %column.name, storage_type = %column.storage_type, error = %e, "failed to add column");
                Ok(())
            }
        }
    }

    /// Write every row to `path` and release the store.
    ///
    /// The sink is finalized even when the write fails, so later appends are
    /// refused; whatever the store already wrote is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Uninitialized`] if the sink is not open, or the
    /// store's export / close error.
    pub async fn finalize(&mut self, path: &Path) -> Result<ExportSummary> {
        if self.state != SinkState::Open {
            return Err(ExportError::Uninitialized);
        }
        self.state = SinkState::Finalized;

        let exported = self.store.export(path).await;
        let closed = self.store.close().await;
        let rows = exported?;
        closed?;

        info!(rows, skipped = self.skipped, path = %path.display(), "export complete");
        Ok(ExportSummary {
            rows,
            skipped: self.skipped,
            columns: self.registry.columns().to_vec(),
            path: path.to_path_buf(),
        })
    }
}
