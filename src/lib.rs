//! # Parquetflow
//!
//! Streams semi-structured event records into a single Parquet file whose
//! schema is discovered as the records arrive.
//!
//! Every record carries a fixed **envelope** (ids, event type, metadata, time
//! fields) and an open-ended **payload** map. The envelope is stored as one
//! JSON column; each distinct payload field becomes its own typed column the
//! first time it is seen.
//!
//! ## Key Features
//!
//! - **Incremental schema** - columns are added in first-seen order; a
//!   column's type never changes once chosen
//! - **Type inference** - text, timestamps, 64-bit integers, `DECIMAL(38,0)`,
//!   doubles, booleans, and JSON, picked from the first value of each field
//! - **Epoch detection** - 10, 13, and 16 digit integers become timestamps
//!   unless the field name ends in `id`
//! - **No silent precision loss** - integers too large for `i64` go to
//!   `DECIMAL(38,0)`, and past 38 digits to text with the exact digits
//! - **Resilient** - a bad column or a bad row is logged and skipped; the
//!   stream keeps going
//! - **Replay sources** - JSON Lines files, optionally gzip or zstd
//!   compressed, selected by glob
//!
//! ## Quick Start
//!
//! ```no_run
//! use parquetflow::*;
//! # async fn run() -> anyhow::Result<()> {
//!
//! let config = ExportConfig::default().with_output_dir("./exports");
//! let mut exporter = ParquetExporter::new(config);
//!
//! let records = RecordReader::from_glob("replay/*.jsonl.gz")?;
//! let delivered = StreamDriver::new().run(&mut exporter, records).await?;
//!
//! if let Some(summary) = exporter.summary() {
//!     println!("{delivered} records, {} rows -> {}", summary.rows, summary.path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Classification
//!
//! [`classify`] maps the first value of a field to a [`StorageType`]. The
//! [`SchemaRegistry`] remembers the result; later values are made to fit by
//! [`coerce`] and the store's native conversion rules in [`store::cast`].
//!
//! ### Table sink
//!
//! A [`TableSink`] owns a [`BackingStore`] and moves through
//! `Uninitialized → Open → Finalized`. The built-in [`ArrowStore`] keeps one
//! Arrow builder per column and writes a single record batch on finalize.
//!
//! ### Output processors
//!
//! [`OutputProcessor`] is the lifecycle a stream host drives:
//! `start`, `process` per record, `error` for source failures, `done` at the
//! end. [`ParquetExporter`] implements it on top of a [`TableSink`], and
//! [`StreamDriver`] is a small host that replays an iterator of records.
//!
//! ## Logging
//!
//! Events are emitted through `tracing`; install any subscriber to see them.
//! The crate never installs one itself.

pub mod classify;
pub mod coerce;
pub mod config;
pub mod driver;
pub mod error;
pub mod io;
pub mod processor;
pub mod record;
pub mod schema;
pub mod sink;
pub mod store;
pub mod timestamp;
pub mod value;

pub use classify::{classify, classify_json};
pub use coerce::coerce;
pub use config::{ArtifactCompression, ExportConfig};
pub use driver::StreamDriver;
pub use error::{ExportError, Result};
pub use io::jsonl::{RecordReader, read_records, write_jsonl};
pub use processor::{Completion, OutputProcessor, ParquetExporter, StreamFlags};
pub use record::{Envelope, Record};
pub use schema::{Column, ColumnSlot, SchemaRegistry, StorageType};
pub use sink::{ExportSummary, SinkState, TableSink};
pub use store::{ArrowStore, BackingStore};
pub use timestamp::{EpochUnit, epoch_unit, is_datetime_string, looks_like_epoch};
pub use value::Value;
