//! Glob expansion for replay file sets.
//!
//! ```no_run
//! use parquetflow::io::glob::expand_glob;
//!
//! // every day of one month, in lexicographic (and so chronological) order
//! let files = expand_glob("replay/2024-01-*/events.jsonl.gz")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result, bail};
use glob::glob;
use std::path::PathBuf;

/// Files matching `pattern`, sorted so replays are deterministic.
///
/// Directories are skipped. A pattern without wildcards that names an
/// existing file yields just that file.
///
/// # Errors
///
/// Returns an error if the pattern is invalid, a directory cannot be read,
/// or nothing matches.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| format!("read glob entry for {pattern}"))?;
        if path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        bail!("no files found matching pattern: {pattern}");
    }
    files.sort();
    Ok(files)
}
