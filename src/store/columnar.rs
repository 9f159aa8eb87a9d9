//! In-memory Arrow table flushed to a single Parquet file.
//!
//! Each column owns one Arrow builder. Adding a column backfills it with a
//! null per existing row, so every builder always holds `rows` entries and
//! the finished arrays line up into one [`RecordBatch`].

use super::BackingStore;
use super::cast::{Cell, cast};
use crate::config::ArtifactCompression;
use crate::error::{ExportError, Result};
use crate::schema::{Column, DECIMAL_PRECISION, DECIMAL_SCALE, StorageType, TIMESTAMP_TZ};
use crate::value::Value;
use arrow::array::{
    ArrayRef, BooleanBuilder, Decimal128Builder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder,
};
use arrow::datatypes::Schema;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Arrow-backed [`BackingStore`].
#[derive(Debug)]
pub struct ArrowStore {
    props: WriterProperties,
    table: Option<Table>,
}

#[derive(Debug)]
struct Table {
    columns: Vec<Column>,
    builders: Vec<ColumnBuilder>,
    rows: usize,
}

impl ArrowStore {
    /// Create a store that writes with the given Parquet properties.
    #[must_use]
    pub fn new(props: WriterProperties) -> Self {
        Self { props, table: None }
    }

    /// Create a store using `compression` for every column chunk.
    #[must_use]
    pub fn with_compression(compression: ArtifactCompression) -> Self {
        Self::new(compression.writer_properties())
    }

    /// `true` between [`open`](BackingStore::open) and [`close`](BackingStore::close).
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.table.is_some()
    }

    /// Columns currently in the table, envelope first.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        self.table.as_ref().map_or(&[][..], |t| t.columns.as_slice())
    }

    /// Snapshot of every row appended so far, without consuming the builders.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Uninitialized`] if the store is not open, or an
    /// Arrow error if the arrays do not match the schema.
    pub fn record_batch(&self) -> Result<RecordBatch> {
        let table = self.table.as_ref().ok_or(ExportError::Uninitialized)?;
        let schema = Schema::new(table.columns.iter().map(Column::field).collect::<Vec<_>>());
        let arrays: Vec<ArrayRef> = table.builders.iter().map(ColumnBuilder::finish_cloned).collect();
        Ok(RecordBatch::try_new(Arc::new(schema), arrays)?)
    }

    fn table_mut(&mut self) -> Result<&mut Table> {
        self.table.as_mut().ok_or(ExportError::Uninitialized)
    }
}

impl Default for ArrowStore {
    fn default() -> Self {
        Self::with_compression(ArtifactCompression::default())
    }
}

#[async_trait]
impl BackingStore for ArrowStore {
    async fn open(&mut self, envelope: &Column) -> Result<()> {
        if self.table.is_some() {
            return Err(ExportError::AlreadyStarted);
        }
        self.table = Some(Table {
            columns: vec![envelope.clone()],
            builders: vec![ColumnBuilder::new(envelope.storage_type, 0)?],
            rows: 0,
        });
        Ok(())
    }

    async fn add_column(&mut self, column: &Column) -> Result<()> {
        let table = self.table_mut()?;
        if table
            .columns
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&column.name))
        {
            return Err(ExportError::ColumnRejected {
                column: column.name.clone(),
                reason: "column already exists".to_string(),
            });
        }
        let builder = ColumnBuilder::new(column.storage_type, table.rows)?;
        table.columns.push(column.clone());
        table.builders.push(builder);
        Ok(())
    }

    async fn append_row(&mut self, row: Vec<Value>) -> Result<()> {
        let table = self.table_mut()?;
        if row.len() != table.columns.len() {
            return Err(ExportError::RowWidth {
                expected: table.columns.len(),
                actual: row.len(),
            });
        }

        let cells = row
            .into_iter()
            .zip(&table.columns)
            .map(|(value, column)| {
                cast(value, column.storage_type).map_err(|message| ExportError::Coercion {
                    column: column.name.clone(),
                    message,
                })
            })
            .collect::<Result<Vec<Cell>>>()?;

        for (builder, cell) in table.builders.iter_mut().zip(cells) {
            builder.append(cell)?;
        }
        table.rows += 1;
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.rows)
    }

    async fn export(&mut self, path: &Path) -> Result<usize> {
        let batch = self.record_batch()?;
        let rows = batch.num_rows();
        let props = self.props.clone();
        let path = path.to_path_buf();
        debug!(path = %path.display(), rows, "writing parquet artifact");
        tokio::task::spawn_blocking(move || write_artifact(&path, &batch, props)).await??;
        Ok(rows)
    }

    async fn close(&mut self) -> Result<()> {
        self.table.take().map(|_| ()).ok_or(ExportError::Uninitialized)
    }
}

fn write_artifact(path: &Path, batch: &RecordBatch, props: WriterProperties) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// One Arrow builder per storage type.
#[derive(Debug)]
enum ColumnBuilder {
    Utf8(StringBuilder),
    Timestamp(TimestampMicrosecondBuilder),
    Int64(Int64Builder),
    Decimal(Decimal128Builder),
    Float64(Float64Builder),
    Boolean(BooleanBuilder),
}

impl ColumnBuilder {
    /// A builder for `storage_type` pre-filled with `backfill` nulls.
    fn new(storage_type: StorageType, backfill: usize) -> Result<Self> {
        let mut builder = match storage_type {
            StorageType::Text | StorageType::Json => Self::Utf8(StringBuilder::new()),
            StorageType::Timestamp => {
                Self::Timestamp(TimestampMicrosecondBuilder::new().with_timezone(TIMESTAMP_TZ))
            }
            StorageType::Int64 => Self::Int64(Int64Builder::new()),
            StorageType::Decimal => Self::Decimal(
                Decimal128Builder::new().with_precision_and_scale(DECIMAL_PRECISION, DECIMAL_SCALE)?,
            ),
            StorageType::Double => Self::Float64(Float64Builder::new()),
            StorageType::Boolean => Self::Boolean(BooleanBuilder::new()),
        };
        for _ in 0..backfill {
            builder.append_null();
        }
        Ok(builder)
    }

    fn append_null(&mut self) {
        match self {
            Self::Utf8(b) => b.append_null(),
            Self::Timestamp(b) => b.append_null(),
            Self::Int64(b) => b.append_null(),
            Self::Decimal(b) => b.append_null(),
            Self::Float64(b) => b.append_null(),
            Self::Boolean(b) => b.append_null(),
        }
    }

    fn append(&mut self, cell: Cell) -> std::result::Result<(), ArrowError> {
        match (self, cell) {
            (builder, Cell::Null) => builder.append_null(),
            (Self::Utf8(b), Cell::Utf8(s)) => b.append_value(s),
            (Self::Timestamp(b), Cell::Timestamp(micros)) => b.append_value(micros),
            (Self::Int64(b), Cell::Int64(i)) => b.append_value(i),
            (Self::Decimal(b), Cell::Decimal(d)) => b.append_value(d),
            (Self::Float64(b), Cell::Float64(f)) => b.append_value(f),
            (Self::Boolean(b), Cell::Boolean(v)) => b.append_value(v),
            (_, cell) => {
                return Err(ArrowError::InvalidArgumentError(format!(
                    "cell {cell:?} does not match the column builder"
                )));
            }
        }
        Ok(())
    }

    fn finish_cloned(&self) -> ArrayRef {
        match self {
            Self::Utf8(b) => Arc::new(b.finish_cloned()),
            Self::Timestamp(b) => Arc::new(b.finish_cloned()),
            Self::Int64(b) => Arc::new(b.finish_cloned()),
            Self::Decimal(b) => Arc::new(b.finish_cloned()),
            Self::Float64(b) => Arc::new(b.finish_cloned()),
            Self::Boolean(b) => Arc::new(b.finish_cloned()),
        }
    }
}
