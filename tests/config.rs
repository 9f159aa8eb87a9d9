use anyhow::Result;
use chrono::{TimeZone, Utc};
use parquet::basic::Compression;
use parquetflow::config::{DEFAULT_OUTPUT_DIR, default_filename, normalize_filename};
use parquetflow::{ArtifactCompression, ExportConfig};
use std::path::PathBuf;

#[test]
fn defaults() {
    let config = ExportConfig::default();
    assert_eq!(config.filename, None);
    assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    assert_eq!(config.compression, ArtifactCompression::Gzip);
    assert_eq!(config.envelope_column, "envelope");
    assert_eq!(config.progress_interval, 100);
}

#[test]
fn filenames_get_parquet_extension() {
    assert_eq!(normalize_filename("daily".into()), "daily.parquet");
    assert_eq!(normalize_filename("daily.parquet".into()), "daily.parquet");
    let config = ExportConfig::default().with_filename("daily");
    assert_eq!(config.filename.as_deref(), Some("daily.parquet"));
}

#[test]
fn generated_name_replaces_separators() -> Result<()> {
    let now = Utc
        .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous time"))?
        + chrono::Duration::milliseconds(678);
    assert_eq!(default_filename(now), "events_2024-01-02T03-04-05-678Z.parquet");

    let config = ExportConfig::default().with_output_dir("/data/out");
    assert_eq!(
        config.resolve_path(now),
        PathBuf::from("/data/out/events_2024-01-02T03-04-05-678Z.parquet")
    );
    Ok(())
}

#[test]
fn deserializes_partial_config() -> Result<()> {
    let config: ExportConfig =
        serde_json::from_str(r#"{"filename": "nightly", "compression": "zstd"}"#)?;
    assert_eq!(config.compression, ArtifactCompression::Zstd);
    assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    assert_eq!(config.artifact_name(Utc::now()), "nightly.parquet");
    Ok(())
}

#[test]
fn compression_codecs() {
    assert!(matches!(ArtifactCompression::Gzip.codec(), Compression::GZIP(_)));
    assert!(matches!(ArtifactCompression::Zstd.codec(), Compression::ZSTD(_)));
    assert_eq!(ArtifactCompression::Snappy.codec(), Compression::SNAPPY);
    assert_eq!(ArtifactCompression::Uncompressed.codec(), Compression::UNCOMPRESSED);
}
