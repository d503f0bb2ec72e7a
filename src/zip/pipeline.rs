//! Per-entry streaming: read, hash, compress, write.
//!
//! The source is wrapped in a [`HashingReader`] that updates the CRC-32 and
//! the uncompressed byte count as bytes are pulled through it. The codec's
//! encoder reads from that wrapper and its output is copied to the
//! destination in bounded chunks. Nothing is buffered beyond one chunk plus
//! whatever the codec keeps internally.
//!
//! The hasher and the encoder consume the same byte sequence in order, but
//! their chunk boundaries are independent: the encoder decides how much it
//! pulls per read.

use std::io::{self, Read, Write};

use crc32fast::Hasher;

use crate::error::Result;

use super::codec::Codec;

/// Size of the buffer used to move encoded bytes to the destination.
pub const CHUNK_SIZE: usize = 8192;

/// A reader decorator that checksums and counts everything read through it.
pub struct HashingReader<R> {
    inner: R,
    hasher: Hasher,
    count: u64,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Hasher::new(),
            count: 0,
        }
    }

    /// Bytes read so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Final CRC-32 and byte count.
    pub fn finish(self) -> (u32, u64) {
        (self.hasher.finalize(), self.count)
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.count += n as u64;
        Ok(n)
    }
}

/// Totals for one streamed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryTotals {
    pub crc32: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
}

/// Stream `source` through `codec` into `sink`.
///
/// The checksum and uncompressed size describe the bytes read from `source`;
/// the compressed size is the number of bytes written to `sink`.
pub fn process_entry<R, W>(source: R, codec: &dyn Codec, sink: &mut W) -> Result<EntryTotals>
where
    R: Read,
    W: Write + ?Sized,
{
    let mut hashing = HashingReader::new(source);
    let mut compressed_size = 0u64;

    {
        let mut encoder = codec.encoder(Box::new(&mut hashing));
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match encoder.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            sink.write_all(&buf[..n])?;
            compressed_size += n as u64;
        }
    }

    let (crc32, uncompressed_size) = hashing.finish();
    log::trace!(
        "streamed {uncompressed_size} bytes as {compressed_size} ({:?}), crc32 {crc32:08x}",
        codec.method()
    );

    Ok(EntryTotals {
        crc32,
        uncompressed_size,
        compressed_size,
    })
}
