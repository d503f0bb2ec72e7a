//! # streamzip
//!
//! A one-pass streaming ZIP archive writer.
//!
//! Each input file is read in bounded chunks, checksummed, optionally
//! compressed and written straight to the output. Because sizes and CRCs are
//! only known after the data, they are written in a data descriptor after
//! each entry instead of being patched into the local header. The output is
//! never seeked, so it can be a pipe or standard output.
//!
//! ## Features
//!
//! - STORE and DEFLATE, plus caller-registered codecs
//! - Per-entry method, modification time and comment overrides
//! - Sources are shared-locked while the archive is built
//! - Archive comment in UTF-8 or DOS code page 866
//!
//! ## Example
//!
//! ```no_run
//! use streamzip::{ArchiveOptions, CompressionMethod, Destination, EntrySource, ZipBuilder};
//!
//! fn main() -> streamzip::Result<()> {
//!     let builder = ZipBuilder::default();
//!     let options = ArchiveOptions::new()
//!         .method(CompressionMethod::Deflate)
//!         .comment("nightly logs");
//!
//!     let summary = builder.build(
//!         &Destination::parse("logs.zip"),
//!         [
//!             ("app.log", EntrySource::path("/var/log/app.log")),
//!             ("README", EntrySource::path("README.md").method(CompressionMethod::Stored)),
//!         ],
//!         &options,
//!     )?;
//!
//!     for entry in &summary.entries {
//!         println!("{} {} -> {}", entry.name, entry.uncompressed_size, entry.compressed_size);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::{Result, ZipError};
pub use io::{Destination, EntrySource, SourceGuard, SourceLocator};
pub use zip::{
    ArchiveOptions, BuildSummary, CommentEncoding, CompressionMethod, DeflateCodec, EntrySummary,
    MethodRegistry, ZipBuilder,
};
