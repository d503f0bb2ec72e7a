//! Shared test utilities for integration tests.
//!
//! Holds a small ZIP reader used to check what the builder wrote: it finds
//! the end record, walks the central directory, follows each local header and
//! data descriptor and inflates DEFLATE data. It panics on anything malformed.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use tempfile::TempDir;

pub const LFH_SIGNATURE: u32 = 0x0403_4b50;
pub const DD_SIGNATURE: u32 = 0x0807_4b50;
pub const CDFH_SIGNATURE: u32 = 0x0201_4b50;
pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;
pub const EOCD_SIZE: usize = 22;

/// One member as seen through the central directory.
#[derive(Debug, Clone)]
pub struct ReadEntry {
    pub name: String,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub lfh_offset: u32,
    pub comment: Vec<u8>,
    /// Values from the data descriptor after the entry data.
    pub descriptor: (u32, u32, u32),
    /// Offset just past the data descriptor.
    pub end_offset: u64,
    /// Decompressed content.
    pub data: Vec<u8>,
}

impl ReadEntry {
    /// (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

#[derive(Debug, Clone)]
pub struct ReadArchive {
    pub entries: Vec<ReadEntry>,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment: Vec<u8>,
}

impl ReadArchive {
    pub fn entry(&self, name: &str) -> Option<&ReadEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Locate the end record by scanning backwards for a signature whose comment
/// length matches the remaining bytes.
fn find_eocd(bytes: &[u8]) -> usize {
    assert!(bytes.len() >= EOCD_SIZE, "archive shorter than an end record");
    for i in (0..=bytes.len() - EOCD_SIZE).rev() {
        if bytes[i..i + 4] == EOCD_SIGNATURE.to_le_bytes() {
            let comment_len = u16::from_le_bytes([bytes[i + 20], bytes[i + 21]]) as usize;
            if comment_len == bytes.len() - i - EOCD_SIZE {
                return i;
            }
        }
    }
    panic!("no end of central directory record");
}

pub fn read_archive(bytes: &[u8]) -> ReadArchive {
    let eocd_offset = find_eocd(bytes);
    let mut cursor = Cursor::new(&bytes[eocd_offset + 4..]);
    let disk_number = cursor.read_u16::<LittleEndian>().unwrap();
    let disk_with_cd = cursor.read_u16::<LittleEndian>().unwrap();
    let disk_entries = cursor.read_u16::<LittleEndian>().unwrap();
    let total_entries = cursor.read_u16::<LittleEndian>().unwrap();
    let cd_size = cursor.read_u32::<LittleEndian>().unwrap();
    let cd_offset = cursor.read_u32::<LittleEndian>().unwrap();
    let comment_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;
    let comment = bytes[eocd_offset + EOCD_SIZE..eocd_offset + EOCD_SIZE + comment_len].to_vec();
    assert_eq!((disk_number, disk_with_cd), (0, 0));

    let cd = &bytes[cd_offset as usize..cd_offset as usize + cd_size as usize];
    let mut cursor = Cursor::new(cd);
    let mut entries = Vec::new();
    for _ in 0..total_entries {
        entries.push(read_cdfh(&mut cursor, bytes));
    }
    assert_eq!(cursor.position(), cd_size as u64, "central directory size mismatch");
    assert_eq!(
        cd_offset as usize + cd_size as usize,
        eocd_offset,
        "central directory must end at the end record"
    );

    ReadArchive {
        entries,
        disk_entries,
        total_entries,
        cd_size,
        cd_offset,
        comment,
    }
}

fn read_cdfh(cursor: &mut Cursor<&[u8]>, archive: &[u8]) -> ReadEntry {
    assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), CDFH_SIGNATURE);
    let version_made_by = cursor.read_u16::<LittleEndian>().unwrap();
    let version_needed = cursor.read_u16::<LittleEndian>().unwrap();
    let flags = cursor.read_u16::<LittleEndian>().unwrap();
    let method = cursor.read_u16::<LittleEndian>().unwrap();
    let last_mod_time = cursor.read_u16::<LittleEndian>().unwrap();
    let last_mod_date = cursor.read_u16::<LittleEndian>().unwrap();
    let crc32 = cursor.read_u32::<LittleEndian>().unwrap();
    let compressed_size = cursor.read_u32::<LittleEndian>().unwrap();
    let uncompressed_size = cursor.read_u32::<LittleEndian>().unwrap();
    let name_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;
    let extra_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;
    let comment_len = cursor.read_u16::<LittleEndian>().unwrap() as usize;
    let disk_number_start = cursor.read_u16::<LittleEndian>().unwrap();
    let internal_attrs = cursor.read_u16::<LittleEndian>().unwrap();
    let external_attrs = cursor.read_u32::<LittleEndian>().unwrap();
    let lfh_offset = cursor.read_u32::<LittleEndian>().unwrap();
    assert_eq!((disk_number_start, internal_attrs, external_attrs), (0, 0, 0));

    let mut name = vec![0u8; name_len];
    cursor.read_exact(&mut name).unwrap();
    let mut extra = vec![0u8; extra_len];
    cursor.read_exact(&mut extra).unwrap();
    let mut comment = vec![0u8; comment_len];
    cursor.read_exact(&mut comment).unwrap();
    let name = String::from_utf8(name).expect("names are UTF-8");

    // Local header: same metadata, zero CRC and sizes.
    let lfh = lfh_offset as usize;
    let mut local = Cursor::new(&archive[lfh..]);
    assert_eq!(local.read_u32::<LittleEndian>().unwrap(), LFH_SIGNATURE);
    assert_eq!(local.read_u16::<LittleEndian>().unwrap(), version_needed);
    assert_eq!(local.read_u16::<LittleEndian>().unwrap(), flags);
    assert_eq!(local.read_u16::<LittleEndian>().unwrap(), method);
    assert_eq!(local.read_u16::<LittleEndian>().unwrap(), last_mod_time);
    assert_eq!(local.read_u16::<LittleEndian>().unwrap(), last_mod_date);
    for _ in 0..3 {
        assert_eq!(local.read_u32::<LittleEndian>().unwrap(), 0);
    }
    let local_name_len = local.read_u16::<LittleEndian>().unwrap() as usize;
    let local_extra_len = local.read_u16::<LittleEndian>().unwrap() as usize;
    assert_eq!(&archive[lfh + 30..lfh + 30 + local_name_len], name.as_bytes());

    let data_start = lfh + 30 + local_name_len + local_extra_len;
    let data_end = data_start + compressed_size as usize;
    let raw = &archive[data_start..data_end];

    let mut dd = Cursor::new(&archive[data_end..data_end + 16]);
    assert_eq!(dd.read_u32::<LittleEndian>().unwrap(), DD_SIGNATURE);
    let descriptor = (
        dd.read_u32::<LittleEndian>().unwrap(),
        dd.read_u32::<LittleEndian>().unwrap(),
        dd.read_u32::<LittleEndian>().unwrap(),
    );

    let data = match method {
        0 => raw.to_vec(),
        8 => {
            let mut out = Vec::new();
            DeflateDecoder::new(raw).read_to_end(&mut out).unwrap();
            out
        }
        other => panic!("test reader cannot decode method {other}"),
    };
    assert_eq!(data.len(), uncompressed_size as usize);
    assert_eq!(crc32fast::hash(&data), crc32, "CRC mismatch for {name}");

    ReadEntry {
        name,
        version_made_by,
        version_needed,
        flags,
        method,
        last_mod_time,
        last_mod_date,
        crc32,
        compressed_size,
        uncompressed_size,
        lfh_offset,
        comment,
        descriptor,
        end_offset: (data_end + 16) as u64,
        data,
    }
}

/// Write files into a fresh temporary directory.
pub fn temp_files(files: &[(&str, &[u8])]) -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let paths = files
        .iter()
        .map(|(name, data)| {
            let path = dir.path().join(name);
            std::fs::write(&path, data).expect("Failed to write source file");
            path
        })
        .collect();
    (dir, paths)
}
