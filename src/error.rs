//! Error types for archive building.
//!
//! Every fallible operation in this crate returns [`Result<T>`]. A build stops
//! at the first error; the destination may then hold a truncated archive.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort an archive build.
#[derive(Debug, Error)]
pub enum ZipError {
    /// The output archive could not be created.
    #[error("cannot open destination {}: {source}", path.display())]
    CannotOpenDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An input file could not be opened or inspected.
    #[error("cannot open source {}: {source}", path.display())]
    CannotOpenSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An input file could not be shared-locked.
    #[error("cannot lock source {}: {source}", path.display())]
    CannotLockSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No codec is registered for the requested compression method.
    #[error("compression method {method} is not supported")]
    UnsupportedMethod { method: u16 },

    /// A read or write failed while streaming.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A timestamp cannot be expressed as a DOS date.
    #[error("year {year} is outside the DOS date range 1980..=2107")]
    OutOfRange { year: i32 },

    /// An archive-internal name is empty or too long.
    #[error("invalid entry name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A comment does not fit its 16-bit length field.
    #[error("comment is {len} bytes, the limit is 65535")]
    CommentTooLong { len: usize },

    /// The archive comment has a character the chosen code page lacks.
    #[error("archive comment character {character:?} has no {encoding} mapping")]
    UnmappableComment { character: char, encoding: &'static str },

    /// A value does not fit a 32-bit ZIP field.
    #[error("archive too large: {what} exceeds the ZIP32 limit")]
    ArchiveTooLarge { what: &'static str },
}

pub type Result<T> = std::result::Result<T, ZipError>;
