//! Byte sources and sinks for archive building.
//!
//! - [`source`]: input files, opened and shared-locked for the duration of a build
//! - [`destination`]: the archive output, a file or standard output
//! - [`counting`]: the byte-offset counter wrapped around the output

mod counting;
mod destination;
mod source;

pub use counting::CountingWriter;
pub use destination::{ArchiveSink, Destination};
pub use source::{EntrySource, SourceGuard, SourceLocator};
