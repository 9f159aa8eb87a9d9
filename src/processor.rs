//! Output processors: the lifecycle contract a stream host drives.
//!
//! A host calls [`OutputProcessor::start`] once, then
//! [`process`](OutputProcessor::process) for every record in arrival order,
//! [`error`](OutputProcessor::error) whenever its own source fails, and
//! finally [`done`](OutputProcessor::done) once the stream has ended (never
//! for a live stream).
//!
//! [`ParquetExporter`] is the processor that streams records into a
//! [`TableSink`] and writes the Parquet artifact on `done`.

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::record::Record;
use crate::sink::{ExportSummary, SinkState, TableSink};
use crate::store::{ArrowStore, BackingStore};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Flags the host attaches to each delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamFlags {
    /// The stream follows live events and has no natural end.
    pub live: bool,
}

/// Cooperative early-termination handle.
///
/// A processor calls [`complete`](Completion::complete) to ask the host to
/// stop delivering records; the record in flight still finishes.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    token: CancellationToken,
}

impl Completion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the host to stop after the current record.
    pub fn complete(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`complete`](Self::complete) has been called.
    pub async fn completed(&self) {
        self.token.cancelled().await;
    }
}

/// A sink for a stream of records.
#[async_trait]
pub trait OutputProcessor: Send {
    /// Stable identifier.
    fn name(&self) -> &'static str;

    /// One-line description for help output.
    fn description(&self) -> &'static str;

    /// Prepare to receive records.
    ///
    /// # Errors
    ///
    /// Any error is fatal: the host must not deliver records.
    async fn start(&mut self) -> Result<()>;

    /// Handle one record. Failures are handled inside and never reach the host.
    async fn process(&mut self, record: &Record, flags: StreamFlags, complete: &Completion);

    /// The host's source failed; the stream continues.
    async fn error(&mut self, error: &anyhow::Error);

    /// The stream has ended.
    async fn done(&mut self);
}

/// Streams records into a Parquet artifact.
#[derive(Debug)]
pub struct ParquetExporter<S: BackingStore = ArrowStore> {
    config: ExportConfig,
    sink: TableSink<S>,
    processed: u64,
    summary: Option<ExportSummary>,
}

impl ParquetExporter<ArrowStore> {
    /// Exporter over an in-memory Arrow store compressed per `config`.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        let store = ArrowStore::new(config.writer_properties());
        Self::with_store(config, store)
    }
}

impl<S: BackingStore> ParquetExporter<S> {
    /// Exporter over a caller-supplied store.
    pub fn with_store(config: ExportConfig, store: S) -> Self {
        let sink = TableSink::new(store, &config.envelope_column);
        Self {
            config,
            sink,
            processed: 0,
            summary: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    #[must_use]
    pub fn sink(&self) -> &TableSink<S> {
        &self.sink
    }

    /// Records handed to [`process`](OutputProcessor::process) so far, including skipped ones.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Result of the last successful `done`.
    #[must_use]
    pub fn summary(&self) -> Option<&ExportSummary> {
        self.summary.as_ref()
    }

    async fn finish(&mut self) -> anyhow::Result<ExportSummary> {
        if self.sink.state() != SinkState::Open {
            return Err(ExportError::Uninitialized.into());
        }
        let dir = &self.config.output_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("mkdir -p {}", dir.display()))?;
        let path = self.config.resolve_path(Utc::now());
        let summary = self
            .sink
            .finalize(&path)
            .await
            .with_context(|| format!("export to {}", path.display()))?;
        Ok(summary)
    }
}

#[async_trait]
impl<S: BackingStore> OutputProcessor for ParquetExporter<S> {
    fn name(&self) -> &'static str {
        "export-parquet"
    }

    fn description(&self) -> &'static str {
        "Export data as parquet files"
    }

    async fn start(&mut self) -> Result<()> {
        info!(output_dir = %self.config.output_dir.display(), "starting parquet export");
        self.sink.start().await.inspect_err(|e| {
            error!(error = %e, "failed to initialize backing store");
        })
    }

    async fn process(&mut self, record: &Record, _flags: StreamFlags, _complete: &Completion) {
        self.processed += 1;
        match self.sink.append_record(record).await {
            Ok(()) => {
                let rows = self.sink.rows() as u64;
                let every = self.config.progress_interval;
                if every > 0 && rows % every == 0 {
                    info!(rows, processed = self.processed, "export progress");
                }
            }
            Err(e @ ExportError::Uninitialized) => {
                error!(event_id = %record.event_id, error = %e, "record not written");
            }
            Err(e) => {
                warn!(event_id = %record.event_id, error = %e, "record skipped");
            }
        }
    }

    async fn error(&mut self, error: &anyhow::Error) {
        let message = format!("{error:#}");
        warn!(error = %message, "stream source error");
    }

    async fn done(&mut self) {
        match self.finish().await {
            Ok(summary) => {
                info!(
                    rows = summary.rows,
                    columns = summary.columns.len(),
                    path = %summary.path.display(),
                    "parquet export written"
                );
                self.summary = Some(summary);
            }
            Err(e) => {
                let message = format!("{e:#}");
                error!(error = %message, "parquet export failed");
            }
        }
    }
}
