//! Record sources for replaying exported streams from disk.
//!
//! - [`jsonl`]: JSON Lines readers and writers for [`Record`](crate::record::Record)s
//! - [`compression`]: transparent gzip / zstd handling by extension or magic bytes
//! - [`glob`]: sorted file-set expansion

pub mod compression;
pub mod glob;
pub mod jsonl;
