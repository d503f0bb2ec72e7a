//! Archive assembly.
//!
//! A build runs in two phases:
//!
//! 1. **Prepare**: validate every name, resolve every entry's method against
//!    the registry, and open and shared-lock every source. Nothing has been
//!    written yet, so any failure here leaves the destination untouched.
//! 2. **Stream**: for each entry in order write the local header, stream the
//!    data, write the data descriptor and append the central directory entry
//!    to an in-memory buffer. Then write the central directory and the end
//!    record.
//!
//! The output offset, the central directory buffer and the open sources live
//! in a `BuildSession` that exists for one call only.

use std::collections::HashSet;
use std::io::Write;

use crate::error::{Result, ZipError};
use crate::io::{CountingWriter, Destination, EntrySource, SourceGuard};

use super::codec::{Codec, MethodRegistry};
use super::dostime::DosDateTime;
use super::pipeline::{EntryTotals, process_entry};
use super::structures::{
    CentralDirectoryEntry, CompressionMethod, DataDescriptor, ENTRY_FLAGS,
    EndOfCentralDirectory, LocalFileHeader,
};

/// Largest value of a 16-bit length or count field.
const MAX_U16: usize = u16::MAX as usize;

/// Character set used for the archive comment.
///
/// The end record has no encoding flag, so readers fall back to a DOS code
/// page. Entry comments are always UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentEncoding {
    Utf8,
    /// DOS Cyrillic (IBM866). ASCII text is unchanged.
    #[default]
    Cp866,
}

impl CommentEncoding {
    /// Encode `text`, failing on the first character the code page lacks.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            CommentEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            CommentEncoding::Cp866 => {
                let (bytes, _, unmappable) = encoding_rs::IBM866.encode(text);
                if unmappable {
                    let character = text
                        .chars()
                        .find(|c| {
                            let mut buf = [0u8; 4];
                            encoding_rs::IBM866.encode(c.encode_utf8(&mut buf)).2
                        })
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Err(ZipError::UnmappableComment {
                        character,
                        encoding: encoding_rs::IBM866.name(),
                    });
                }
                Ok(bytes.into_owned())
            }
        }
    }
}

/// Archive-wide options.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub comment: String,
    /// Used by entries that do not choose a method.
    pub method: CompressionMethod,
    pub comment_encoding: CommentEncoding,
}

impl ArchiveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn comment_encoding(mut self, encoding: CommentEncoding) -> Self {
        self.comment_encoding = encoding;
        self
    }
}

/// What was written for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub name: String,
    pub method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    /// Offset of the entry's local header.
    pub offset: u64,
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub entries: Vec<EntrySummary>,
    pub central_directory_offset: u64,
    pub central_directory_size: u64,
    /// Total bytes written.
    pub archive_size: u64,
}

/// An entry whose source is open and locked and whose codec is known.
struct PreparedEntry<'r> {
    name: String,
    guard: SourceGuard,
    codec: &'r dyn Codec,
    timestamp: DosDateTime,
    comment: Vec<u8>,
}

/// Builds ZIP archives with a fixed set of codecs.
#[derive(Debug, Default)]
pub struct ZipBuilder {
    registry: MethodRegistry,
}

impl ZipBuilder {
    pub fn new(registry: MethodRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Build an archive into `destination`.
    ///
    /// A file destination is flushed and closed; standard output is flushed
    /// only. On error the destination may hold a truncated archive. Callers
    /// that need atomic output should build to a temporary path and rename.
    pub fn build<I, N>(
        &self,
        destination: &Destination,
        entries: I,
        options: &ArchiveOptions,
    ) -> Result<BuildSummary>
    where
        I: IntoIterator<Item = (N, EntrySource)>,
        N: Into<String>,
    {
        let comment = encode_archive_comment(options)?;
        let prepared = self.prepare(entries, options)?;

        let sink = destination.open()?;
        log::debug!("writing archive to {destination}");
        let (sink, summary) = BuildSession::new(sink).run(prepared, comment)?;
        sink.close()?;

        Ok(summary)
    }

    /// Build an archive into any writer. The writer is flushed, not closed.
    pub fn build_to_writer<W, I, N>(
        &self,
        writer: W,
        entries: I,
        options: &ArchiveOptions,
    ) -> Result<BuildSummary>
    where
        W: Write,
        I: IntoIterator<Item = (N, EntrySource)>,
        N: Into<String>,
    {
        let comment = encode_archive_comment(options)?;
        let prepared = self.prepare(entries, options)?;
        let (_, summary) = BuildSession::new(writer).run(prepared, comment)?;
        Ok(summary)
    }

    /// Validate, resolve and lock every entry before anything is written.
    ///
    /// Guards acquired before a failure are released when the partially
    /// filled vector is dropped.
    fn prepare<I, N>(&self, entries: I, options: &ArchiveOptions) -> Result<Vec<PreparedEntry<'_>>>
    where
        I: IntoIterator<Item = (N, EntrySource)>,
        N: Into<String>,
    {
        let mut prepared = Vec::new();
        let mut seen = HashSet::new();

        for (name, source) in entries {
            let name: String = name.into();
            validate_name(&name)?;
            if !seen.insert(name.clone()) {
                return Err(ZipError::InvalidName {
                    name,
                    reason: "duplicate name",
                });
            }
            if prepared.len() == MAX_U16 {
                return Err(ZipError::ArchiveTooLarge {
                    what: "entry count",
                });
            }

            let method = source.method.unwrap_or(options.method);
            let codec = self.registry.resolve(method)?;

            let comment = source.comment.unwrap_or_default().into_bytes();
            if comment.len() > MAX_U16 {
                return Err(ZipError::CommentTooLong { len: comment.len() });
            }

            let guard = SourceGuard::acquire(source.locator)?;
            let timestamp = match source.modified {
                // Overrides are instants; pack them in the local calendar too.
                Some(modified) => DosDateTime::from_system_time(modified.into())?,
                None => DosDateTime::from_system_time(guard.modified())?,
            };

            prepared.push(PreparedEntry {
                name,
                guard,
                codec,
                timestamp,
                comment,
            });
        }

        Ok(prepared)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.len() > MAX_U16 {
        "name is longer than 65535 bytes"
    } else {
        return Ok(());
    };
    Err(ZipError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

fn encode_archive_comment(options: &ArchiveOptions) -> Result<Vec<u8>> {
    let comment = options.comment_encoding.encode(&options.comment)?;
    if comment.len() > MAX_U16 {
        return Err(ZipError::CommentTooLong { len: comment.len() });
    }
    Ok(comment)
}

fn to_u32(value: u64, what: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| ZipError::ArchiveTooLarge { what })
}

/// State owned by one build call.
struct BuildSession<W: Write> {
    out: CountingWriter<W>,
    central_directory: Vec<u8>,
    entries: Vec<EntrySummary>,
}

impl<W: Write> BuildSession<W> {
    fn new(writer: W) -> Self {
        Self {
            out: CountingWriter::new(writer),
            central_directory: Vec::new(),
            entries: Vec::new(),
        }
    }

    fn run(mut self, prepared: Vec<PreparedEntry<'_>>, comment: Vec<u8>) -> Result<(W, BuildSummary)> {
        // Entries not yet reached keep their locks until this iterator is
        // dropped, including when an earlier entry fails.
        for entry in prepared {
            self.write_entry(entry)?;
        }
        self.finish(comment)
    }

    fn write_entry(&mut self, entry: PreparedEntry<'_>) -> Result<()> {
        let PreparedEntry {
            name,
            mut guard,
            codec,
            timestamp,
            comment,
        } = entry;

        let offset = self.out.count();
        let lfh_offset = to_u32(offset, "local header offset")?;
        let method = codec.method();
        let flags = ENTRY_FLAGS | codec.flags();
        log::debug!("adding {name} at offset {offset} ({method:?})");

        let header = LocalFileHeader {
            version_needed: codec.version_needed(),
            flags,
            method: method.as_u16(),
            last_mod_time: timestamp.time,
            last_mod_date: timestamp.date,
            name: name.clone().into_bytes(),
            extra: Vec::new(),
        };
        header.write_to(&mut self.out)?;

        let totals = process_entry(&mut guard, codec, &mut self.out)?;
        if totals.uncompressed_size != guard.size() {
            log::warn!(
                "{} was {} bytes when opened but {} bytes were read",
                guard.path().display(),
                guard.size(),
                totals.uncompressed_size
            );
        }
        guard.release();
        drop(guard);

        let EntryTotals {
            crc32,
            uncompressed_size,
            compressed_size,
        } = totals;
        let descriptor = DataDescriptor {
            crc32,
            compressed_size: to_u32(compressed_size, "compressed size")?,
            uncompressed_size: to_u32(uncompressed_size, "uncompressed size")?,
        };
        descriptor.write_to(&mut self.out)?;

        let central = CentralDirectoryEntry {
            version_made_by: CentralDirectoryEntry::VERSION_MADE_BY,
            version_needed: header.version_needed,
            flags,
            method: header.method,
            last_mod_time: header.last_mod_time,
            last_mod_date: header.last_mod_date,
            crc32: descriptor.crc32,
            compressed_size: descriptor.compressed_size,
            uncompressed_size: descriptor.uncompressed_size,
            disk_number_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            lfh_offset,
            name: header.name,
            extra: header.extra,
            comment,
        };
        central.write_to(&mut self.central_directory)?;

        self.entries.push(EntrySummary {
            name,
            method,
            crc32,
            compressed_size,
            uncompressed_size,
            offset,
        });
        Ok(())
    }

    fn finish(mut self, comment: Vec<u8>) -> Result<(W, BuildSummary)> {
        let cd_offset = self.out.count();
        let cd_size = self.central_directory.len() as u64;
        // Bounded by the entry limit checked during preparation.
        let count = self.entries.len() as u16;

        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: count,
            total_entries: count,
            cd_size: to_u32(cd_size, "central directory size")?,
            cd_offset: to_u32(cd_offset, "central directory offset")?,
            comment,
        };

        self.out.write_all(&self.central_directory)?;
        eocd.write_to(&mut self.out)?;
        self.out.flush()?;

        let summary = BuildSummary {
            entries: self.entries,
            central_directory_offset: cd_offset,
            central_directory_size: cd_size,
            archive_size: self.out.count(),
        };
        log::debug!(
            "wrote {} entries, {} bytes",
            summary.entries.len(),
            summary.archive_size
        );
        Ok((self.out.into_inner(), summary))
    }
}
