//! Export configuration.
//!
//! [`ExportConfig`] carries the handful of knobs the exporter accepts. Every
//! field has a default, so an empty JSON object (or `ExportConfig::default()`)
//! is a valid configuration:
//!
//! ```
//! use parquetflow::config::{ArtifactCompression, ExportConfig};
//!
//! let config = ExportConfig::default()
//!     .with_output_dir("/tmp/out")
//!     .with_filename("daily")
//!     .with_compression(ArtifactCompression::Zstd);
//!
//! assert_eq!(config.filename.as_deref(), Some("daily.parquet"));
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default directory for artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "./exports";

/// Default name of the envelope column.
pub const DEFAULT_ENVELOPE_COLUMN: &str = "envelope";

/// Default number of records between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

const PARQUET_EXTENSION: &str = ".parquet";

/// Column-chunk compression applied to the Parquet artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactCompression {
    /// GZIP at the default level.
    #[default]
    Gzip,
    /// Zstandard at the default level.
    Zstd,
    /// Snappy.
    Snappy,
    /// No compression.
    Uncompressed,
}

impl ArtifactCompression {
    /// Parquet codec for this setting.
    #[must_use]
    pub fn codec(self) -> Compression {
        match self {
            Self::Gzip => Compression::GZIP(GzipLevel::default()),
            Self::Zstd => Compression::ZSTD(ZstdLevel::default()),
            Self::Snappy => Compression::SNAPPY,
            Self::Uncompressed => Compression::UNCOMPRESSED,
        }
    }

    /// Writer properties using this codec for every column.
    #[must_use]
    pub fn writer_properties(self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.codec())
            .build()
    }
}

/// Settings for a Parquet export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Artifact file name; `.parquet` is appended when missing. When `None`
    /// a timestamped name is generated at finalize time.
    pub filename: Option<String>,
    /// Directory the artifact is written into; created if missing.
    pub output_dir: PathBuf,
    /// Column-chunk compression.
    pub compression: ArtifactCompression,
    /// Name of the JSON column holding each record's envelope.
    pub envelope_column: String,
    /// Rows written between progress log lines; `0` disables progress logging.
    pub progress_interval: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compression: ArtifactCompression::default(),
            envelope_column: DEFAULT_ENVELOPE_COLUMN.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ExportConfig {
    /// Set the artifact file name, appending `.parquet` if absent.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(normalize_filename(filename.into()));
        self
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the compression codec.
    #[must_use]
    pub fn with_compression(mut self, compression: ArtifactCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Rename the envelope column.
    #[must_use]
    pub fn with_envelope_column(mut self, name: impl Into<String>) -> Self {
        self.envelope_column = name.into();
        self
    }

    /// Set how often progress is logged.
    #[must_use]
    pub fn with_progress_interval(mut self, every: u64) -> Self {
        self.progress_interval = every;
        self
    }

    /// File name for an artifact finalized at `now`.
    ///
    /// Deserialized configs may carry a name without the extension, so it is
    /// normalized here as well.
    #[must_use]
    pub fn artifact_name(&self, now: DateTime<Utc>) -> String {
        self.filename
            .clone()
            .map_or_else(|| default_filename(now), normalize_filename)
    }

    /// Full artifact path for a finalize at `now`.
    #[must_use]
    pub fn resolve_path(&self, now: DateTime<Utc>) -> PathBuf {
        self.output_dir.join(self.artifact_name(now))
    }

    /// Parquet writer properties for this configuration.
    #[must_use]
    pub fn writer_properties(&self) -> WriterProperties {
        self.compression.writer_properties()
    }
}

/// Append `.parquet` unless the name already ends with it.
#[must_use]
pub fn normalize_filename(name: String) -> String {
    if name.ends_with(PARQUET_EXTENSION) {
        name
    } else {
        name + PARQUET_EXTENSION
    }
}

/// Generated artifact name: `events_2024-01-02T03-04-05-678Z.parquet`.
#[must_use]
pub fn default_filename(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(['.', ':'], "-");
    format!("events_{stamp}{PARQUET_EXTENSION}")
}
