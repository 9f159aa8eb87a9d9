//! Storage types, columns, and the schema registry.
//!
//! The registry is an append-only arena of [`Column`]s plus a name → index
//! map. The envelope column always sits at index 0; payload columns follow
//! in the order their field names were first seen. Indices are stable for
//! the lifetime of the table, so rows are assembled by index instead of by
//! name.

use crate::classify::classify;
use crate::error::{ExportError, Result};
use crate::value::Value;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Precision of `DECIMAL` columns.
pub const DECIMAL_PRECISION: u8 = 38;

/// Scale of `DECIMAL` columns.
pub const DECIMAL_SCALE: i8 = 0;

/// Field metadata key marking a UTF-8 column as holding JSON text.
pub const LOGICAL_TYPE_KEY: &str = "parquetflow.logical_type";

/// Timezone attached to `TIMESTAMP` columns.
pub const TIMESTAMP_TZ: &str = "UTC";

/// Column storage type, fixed when the column is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// UTF-8 text. Also the default for null first values and oversize integers.
    Text,
    /// UTC instant with microsecond resolution.
    Timestamp,
    /// Signed 64-bit integer.
    Int64,
    /// `DECIMAL(38,0)` for integers beyond the `i64` range.
    Decimal,
    /// 64-bit float.
    Double,
    /// Boolean.
    Boolean,
    /// JSON document stored as text.
    Json,
}

impl StorageType {
    /// Arrow type used for the column in the artifact.
    #[must_use]
    pub fn data_type(self) -> DataType {
        match self {
            Self::Text | Self::Json => DataType::Utf8,
            Self::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TZ.into())),
            Self::Int64 => DataType::Int64,
            Self::Decimal => DataType::Decimal128(DECIMAL_PRECISION, DECIMAL_SCALE),
            Self::Double => DataType::Float64,
            Self::Boolean => DataType::Boolean,
        }
    }

    /// SQL spelling of the type, as used in log lines.
    #[must_use]
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Text => "VARCHAR",
            Self::Timestamp => "TIMESTAMP",
            Self::Int64 => "BIGINT",
            Self::Decimal => "DECIMAL(38,0)",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::Json => "JSON",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A named, single-typed table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (the payload field name, or the envelope column name).
    pub name: String,
    /// Storage type chosen on first observation.
    pub storage_type: StorageType,
}

impl Column {
    /// Create a column descriptor.
    pub fn new(name: impl Into<String>, storage_type: StorageType) -> Self {
        Self {
            name: name.into(),
            storage_type,
        }
    }

    /// Nullable Arrow field for this column.
    #[must_use]
    pub fn field(&self) -> Field {
        let field = Field::new(&self.name, self.storage_type.data_type(), true);
        if self.storage_type == StorageType::Json {
            field.with_metadata(HashMap::from([(
                LOGICAL_TYPE_KEY.to_string(),
                "JSON".to_string(),
            )]))
        } else {
            field
        }
    }
}

/// Outcome of [`SchemaRegistry::ensure_column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSlot {
    /// The field already has a column at this index.
    Existing(usize),
    /// The field is new; the column must be created in the store and then
    /// [`committed`](SchemaRegistry::commit).
    New(Column),
    /// An earlier attempt to create this column failed; the field is not retried.
    Dropped,
}

impl ColumnSlot {
    /// `true` when the field was seen for the first time.
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// Append-only mapping of field name → column, in first-seen order.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    folded: HashSet<String>,
    attempted: HashSet<String>,
}

impl SchemaRegistry {
    /// Create a registry holding only the envelope column.
    #[must_use]
    pub fn new(envelope_column: &str) -> Self {
        Self {
            columns: vec![Column::new(envelope_column, StorageType::Json)],
            by_name: HashMap::new(),
            folded: HashSet::from([envelope_column.to_lowercase()]),
            attempted: HashSet::new(),
        }
    }

    /// The envelope column (always index 0).
    #[must_use]
    pub fn envelope(&self) -> &Column {
        &self.columns[0]
    }

    /// All columns, envelope first.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Payload columns only, in first-seen order.
    #[must_use]
    pub fn payload_columns(&self) -> &[Column] {
        &self.columns[1..]
    }

    /// Total number of columns including the envelope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`; the envelope column is present from creation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of a payload column.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Storage type of a payload column.
    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<StorageType> {
        self.index_of(name).map(|i| self.columns[i].storage_type)
    }

    /// `true` once a column has been created for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// `true` if creating a column for `name` was ever attempted, whether or not it succeeded.
    #[must_use]
    pub fn was_attempted(&self, name: &str) -> bool {
        self.attempted.contains(name)
    }

    /// Resolve the column slot for a payload field.
    ///
    /// For a field seen for the first time, the name is validated and the
    /// type is classified from `first_value`; the field is marked as
    /// attempted either way, so a rejected name is reported once and then
    /// silently [`Dropped`](ColumnSlot::Dropped) on every later record.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::ColumnRejected`] when the name is empty or
    /// collides (case-insensitively) with the envelope or an existing column.
    pub fn ensure_column(&mut self, name: &str, first_value: &Value) -> Result<ColumnSlot> {
        if let Some(&index) = self.by_name.get(name) {
            return Ok(ColumnSlot::Existing(index));
        }
        if !self.attempted.insert(name.to_string()) {
            return Ok(ColumnSlot::Dropped);
        }
        self.check_name(name)?;
        Ok(ColumnSlot::New(Column::new(
            name,
            classify(first_value, Some(name)),
        )))
    }

    /// Append a column that the store has accepted and return its index.
    pub fn commit(&mut self, column: Column) -> usize {
        let index = self.columns.len();
        self.folded.insert(column.name.to_lowercase());
        self.by_name.insert(column.name.clone(), index);
        self.columns.push(column);
        index
    }

    /// Arrow schema of the table as it stands.
    #[must_use]
    pub fn arrow_schema(&self) -> Schema {
        Schema::new(self.columns.iter().map(Column::field).collect::<Vec<_>>())
    }

    fn check_name(&self, name: &str) -> Result<()> {
        let reason = if name.trim().is_empty() {
            "column name is empty"
        } else if name.eq_ignore_ascii_case(&self.envelope().name) {
            "name is reserved for the envelope column"
        } else if self.folded.contains(&name.to_lowercase()) {
            "a column with the same case-insensitive name already exists"
        } else {
            return Ok(());
        };
        Err(ExportError::ColumnRejected {
            column: name.to_string(),
            reason: reason.to_string(),
        })
    }
}
