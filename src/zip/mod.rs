//! ZIP archive writing.
//!
//! This module produces ZIP archives in a single forward pass, so the output
//! can be a pipe or standard output.
//!
//! ## Architecture
//!
//! - [`structures`]: byte layouts of the four records (local header, data
//!   descriptor, central directory entry, end of central directory)
//! - [`dostime`]: packing timestamps into DOS date/time words
//! - [`codec`]: compression transforms and the method registry
//! - [`pipeline`]: streaming one entry through hash and codec
//! - [`builder`]: assembling entries, central directory and end record
//!
//! ## Output Layout
//!
//! ```text
//! [local header 1][data 1][data descriptor 1]
//! ...
//! [local header n][data n][data descriptor n]
//! [central directory entry 1 .. n]
//! [end of central directory]
//! ```
//!
//! Local headers carry zero CRC and sizes with bit 3 set; the real values
//! follow the data in the descriptor and are repeated in the central directory.
//! Every entry also has bit 11 set, so names and entry comments are UTF-8.
//!
//! ## Limitations
//!
//! - No ZIP64: entries, offsets and the directory must fit in 32 bits and the
//!   entry count in 16 bits
//! - No encryption
//! - No multi-disk archives

pub mod builder;
pub mod codec;
pub mod dostime;
pub mod pipeline;
pub mod structures;

pub use builder::{ArchiveOptions, BuildSummary, CommentEncoding, EntrySummary, ZipBuilder};
pub use codec::{Codec, DeflateCodec, MethodRegistry, StoreCodec};
pub use dostime::DosDateTime;
pub use pipeline::{EntryTotals, HashingReader, process_entry};
pub use structures::*;
