//! Transparent decompression for record files.
//!
//! Replay files are often shipped compressed. [`open_reader`] picks a codec
//! from the file name first and falls back to sniffing the first bytes, so
//! `events.jsonl.gz` and an extensionless gzip dump both read as plain JSONL.
//! [`create_writer`] does the reverse by extension only.
//!
//! Built-in codecs, each behind a feature flag:
//! - **gzip** (`.gz`, `.gzip`) via `flate2` (`compression-gzip`)
//! - **zstd** (`.zst`, `.zstd`) via `zstd` (`compression-zstd`)
//!
//! Further codecs can be added at runtime with [`register_codec`].

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

static CODECS: LazyLock<RwLock<Vec<Arc<dyn CompressionCodec>>>> =
    LazyLock::new(|| RwLock::new(builtin_codecs()));

fn builtin_codecs() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Arc::new(ZstdCodec),
    ]
}

fn codecs() -> Vec<Arc<dyn CompressionCodec>> {
    CODECS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Add a codec to the registry. Later registrations are consulted after the built-ins.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    CODECS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(codec);
}

/// A stream compression format.
pub trait CompressionCodec: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &str;

    /// Lowercase file suffixes, including the dot.
    fn extensions(&self) -> &[&str];

    /// Leading bytes that identify the format, if it has any.
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Wrap `reader` so it yields decompressed bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder cannot be set up.
    fn decoder(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    /// Wrap `writer` so bytes written to it are compressed.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be set up.
    fn encoder(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>>;
}

/// Codec whose extension matches `path`, case-insensitively.
#[must_use]
pub fn codec_for_path(path: &Path) -> Option<Arc<dyn CompressionCodec>> {
    let name = path.to_string_lossy().to_lowercase();
    codecs()
        .into_iter()
        .find(|codec| codec.extensions().iter().any(|ext| name.ends_with(ext)))
}

fn codec_for_header(header: &[u8]) -> Option<Arc<dyn CompressionCodec>> {
    codecs()
        .into_iter()
        .find(|codec| codec.magic_bytes().is_some_and(|magic| header.starts_with(magic)))
}

/// Open `path` for buffered reading, decompressing it if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the decoder fails to start.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;

    if let Some(codec) = codec_for_path(path) {
        let decoded = codec
            .decoder(Box::new(file))
            .with_context(|| format!("start {} decoder for {}", codec.name(), path.display()))?;
        return Ok(Box::new(BufReader::new(decoded)));
    }

    let mut reader = BufReader::new(file);
    let header = reader
        .fill_buf()
        .with_context(|| format!("read header of {}", path.display()))?;
    if let Some(codec) = codec_for_header(header) {
        let decoded = codec
            .decoder(Box::new(reader))
            .with_context(|| format!("start {} decoder for {}", codec.name(), path.display()))?;
        return Ok(Box::new(BufReader::new(decoded)));
    }
    Ok(Box::new(reader))
}

/// Create `path` for writing, compressing by extension.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the encoder fails to start.
pub fn create_writer(path: &Path) -> Result<Box<dyn Write>> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    match codec_for_path(path) {
        Some(codec) => codec
            .encoder(Box::new(BufWriter::new(file)))
            .with_context(|| format!("start {} encoder for {}", codec.name(), path.display())),
        None => Ok(Box::new(BufWriter::new(file))),
    }
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn decoder(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(flate2::read::MultiGzDecoder::new(reader)))
    }

    fn encoder(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        Ok(Box::new(flate2::write::GzEncoder::new(
            writer,
            flate2::Compression::default(),
        )))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn decoder(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }

    fn encoder(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        zstd::stream::write::Encoder::new(writer, 0).map(|e| Box::new(e.auto_finish()) as Box<dyn Write>)
    }
}
