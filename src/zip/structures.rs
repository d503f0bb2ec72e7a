use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// Version of the appnote this writer follows (6.3).
pub const APPNOTE_VERSION: u8 = 63;

/// Host system code for "MS-DOS compatible".
pub const HOST_DOS: u8 = 0;

/// Minimum versions needed to extract.
pub const VERSION_DEFAULT: u16 = 10;
pub const VERSION_DEFLATE: u16 = 20;

/// General purpose bit flags
pub const FLAG_DEFLATE_NORMAL: u16 = 0x0000;
pub const FLAG_DEFLATE_MAX: u16 = 0x0002;
pub const FLAG_DEFLATE_FAST: u16 = 0x0004;
pub const FLAG_DEFLATE_SUPERFAST: u16 = 0x0006;
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
pub const FLAG_UTF8: u16 = 0x0800;

/// Flags set on every entry: names are UTF-8, sizes follow the data.
pub const ENTRY_FLAGS: u16 = FLAG_UTF8 | FLAG_DATA_DESCRIPTOR;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    #[default]
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

/// Length of a variable field as its 16-bit length prefix.
fn field_len(field: &[u8], what: &'static str) -> io::Result<u16> {
    u16::try_from(field.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{what} is longer than 65535 bytes"),
        )
    })
}

/// Local File Header (LFH) - 30 bytes plus name and extra field.
///
/// Always written in one-pass form: CRC and sizes are zero here and carried
/// by the [`DataDescriptor`] that follows the entry data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub name: Vec<u8>,
    pub extra: Vec<u8>,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = 0x0403_4b50;
    pub const SIZE: usize = 30;

    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.name.len() + self.extra.len()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let name_len = field_len(&self.name, "file name")?;
        let extra_len = field_len(&self.extra, "extra field")?;

        w.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.version_needed)?;
        w.write_u16::<LittleEndian>(self.flags)?;
        w.write_u16::<LittleEndian>(self.method)?;
        w.write_u16::<LittleEndian>(self.last_mod_time)?;
        w.write_u16::<LittleEndian>(self.last_mod_date)?;
        // crc32, compressed size, uncompressed size: deferred
        w.write_u32::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_u16::<LittleEndian>(name_len)?;
        w.write_u16::<LittleEndian>(extra_len)?;
        w.write_all(&self.name)?;
        w.write_all(&self.extra)?;
        Ok(())
    }
}

/// Data Descriptor - 16 bytes including the optional signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    pub const SIGNATURE: u32 = 0x0807_4b50;
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes plus name, extra and comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryEntry {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub lfh_offset: u32,
    pub name: Vec<u8>,
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
}

impl CentralDirectoryEntry {
    pub const SIGNATURE: u32 = 0x0201_4b50;
    pub const SIZE: usize = 46;

    /// `version made by`: appnote version in the high byte, host in the low byte.
    pub const VERSION_MADE_BY: u16 = ((APPNOTE_VERSION as u16) << 8) | HOST_DOS as u16;

    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.name.len() + self.extra.len() + self.comment.len()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let name_len = field_len(&self.name, "file name")?;
        let extra_len = field_len(&self.extra, "extra field")?;
        let comment_len = field_len(&self.comment, "file comment")?;

        w.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.version_made_by)?;
        w.write_u16::<LittleEndian>(self.version_needed)?;
        w.write_u16::<LittleEndian>(self.flags)?;
        w.write_u16::<LittleEndian>(self.method)?;
        w.write_u16::<LittleEndian>(self.last_mod_time)?;
        w.write_u16::<LittleEndian>(self.last_mod_date)?;
        w.write_u32::<LittleEndian>(self.crc32)?;
        w.write_u32::<LittleEndian>(self.compressed_size)?;
        w.write_u32::<LittleEndian>(self.uncompressed_size)?;
        w.write_u16::<LittleEndian>(name_len)?;
        w.write_u16::<LittleEndian>(extra_len)?;
        w.write_u16::<LittleEndian>(comment_len)?;
        w.write_u16::<LittleEndian>(self.disk_number_start)?;
        w.write_u16::<LittleEndian>(self.internal_attrs)?;
        w.write_u32::<LittleEndian>(self.external_attrs)?;
        w.write_u32::<LittleEndian>(self.lfh_offset)?;
        w.write_all(&self.name)?;
        w.write_all(&self.extra)?;
        w.write_all(&self.comment)?;
        Ok(())
    }
}

/// End of Central Directory (EOCD) - 22 bytes plus comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x0605_4b50;
    pub const SIZE: usize = 22;

    pub fn encoded_len(&self) -> usize {
        Self::SIZE + self.comment.len()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let comment_len = field_len(&self.comment, "archive comment")?;

        w.write_u32::<LittleEndian>(Self::SIGNATURE)?;
        w.write_u16::<LittleEndian>(self.disk_number)?;
        w.write_u16::<LittleEndian>(self.disk_with_cd)?;
        w.write_u16::<LittleEndian>(self.disk_entries)?;
        w.write_u16::<LittleEndian>(self.total_entries)?;
        w.write_u32::<LittleEndian>(self.cd_size)?;
        w.write_u32::<LittleEndian>(self.cd_offset)?;
        w.write_u16::<LittleEndian>(comment_len)?;
        w.write_all(&self.comment)?;
        Ok(())
    }
}
