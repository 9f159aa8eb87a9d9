//! JSON Lines record sources.
//!
//! One [`Record`] per line. Blank lines are skipped. A line that does not
//! parse becomes an `Err` item carrying the file and line number, and reading
//! continues with the next line, so a host can report it and keep going.

use crate::io::compression::{create_writer, open_reader};
use crate::io::glob::expand_glob;
use crate::record::Record;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Lazily reads records from a sequence of JSONL files, in order.
pub struct RecordReader {
    pending: VecDeque<PathBuf>,
    current: Option<OpenFile>,
}

struct OpenFile {
    path: PathBuf,
    lines: std::io::Lines<Box<dyn BufRead>>,
    line_no: usize,
}

impl RecordReader {
    /// Reader over a single file.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::from_paths([path.into()])
    }

    /// Reader over several files, read one after another.
    #[must_use]
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            pending: paths.into_iter().collect(),
            current: None,
        }
    }

    /// Reader over every file matching `pattern`, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or matches nothing.
    pub fn from_glob(pattern: &str) -> Result<Self> {
        Ok(Self::from_paths(expand_glob(pattern)?))
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(file) = self.current.as_mut() else {
                let path = self.pending.pop_front()?;
                match open_reader(&path) {
                    Ok(reader) => {
                        self.current = Some(OpenFile {
                            path,
                            lines: reader.lines(),
                            line_no: 0,
                        });
                        continue;
                    }
                    Err(e) => return Some(Err(e)),
                }
            };

            let Some(line) = file.lines.next() else {
                self.current = None;
                continue;
            };
            file.line_no += 1;
            let line_no = file.line_no;
            let path = &file.path;

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    // the stream is unusable past a read error
                    let err = anyhow::Error::new(e)
                        .context(format!("read line {line_no} in {}", path.display()));
                    self.current = None;
                    return Some(Err(err));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str::<Record>(&line)
                    .with_context(|| format!("parse line {line_no} in {}", path.display())),
            );
        }
    }
}

/// Read every record from the files matching `pattern`.
///
/// # Errors
///
/// Fails on the first file or line that cannot be read or parsed.
pub fn read_records(pattern: &str) -> Result<Vec<Record>> {
    RecordReader::from_glob(pattern)?.collect()
}

/// Write items as JSON Lines, compressing by extension. Parent directories are created.
///
/// Returns the number of items written.
///
/// # Errors
///
/// Returns an error if the file cannot be created or an item fails to serialize.
pub fn write_jsonl<T: Serialize>(path: impl AsRef<Path>, items: &[T]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let mut writer = create_writer(path)?;
    for (i, item) in items.iter().enumerate() {
        serde_json::to_writer(&mut writer, item)
            .with_context(|| format!("serialize item #{i} to {}", path.display()))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(items.len())
}
