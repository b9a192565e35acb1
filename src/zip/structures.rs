use byteorder::{ByteOrder, LittleEndian};

use crate::error::ArchiveError;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// Position, size and entry count of the central directory, whichever end
/// record they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryLocation {
    pub offset: u64,
    pub size: u64,
    pub entries: u64,
}

impl DirectoryLocation {
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

/// End of central directory record, 22 bytes followed by the archive comment.
#[derive(Debug, Clone, Copy)]
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Decode the record at the start of `data`, or `None` if there isn't one.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE || !data.starts_with(Self::SIGNATURE) {
            return None;
        }
        Some(Self {
            disk_entries: LittleEndian::read_u16(&data[8..]),
            total_entries: LittleEndian::read_u16(&data[10..]),
            cd_size: LittleEndian::read_u32(&data[12..]),
            cd_offset: LittleEndian::read_u32(&data[16..]),
            comment_len: LittleEndian::read_u16(&data[20..]),
        })
    }

    /// Any saturated field means the real values live in the ZIP64 record.
    pub fn is_zip64(&self) -> bool {
        self.disk_entries == u16::MAX
            || self.total_entries == u16::MAX
            || self.cd_size == u32::MAX
            || self.cd_offset == u32::MAX
    }

    pub fn location(&self) -> DirectoryLocation {
        DirectoryLocation {
            offset: self.cd_offset.into(),
            size: self.cd_size.into(),
            entries: self.total_entries.into(),
        }
    }
}

/// ZIP64 end of central directory locator, directly before the classic record.
pub struct Zip64Locator;

impl Zip64Locator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    /// Offset of the ZIP64 end record.
    pub fn record_offset(data: &[u8]) -> Result<u64, ArchiveError> {
        if data.len() < Self::SIZE || !data.starts_with(Self::SIGNATURE) {
            return Err(ArchiveError::CorruptDirectory(
                "invalid ZIP64 end of central directory locator".to_string(),
            ));
        }
        Ok(LittleEndian::read_u64(&data[8..]))
    }
}

/// ZIP64 end of central directory record
pub struct Zip64EndOfCentralDirectory;

impl Zip64EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn location(data: &[u8]) -> Result<DirectoryLocation, ArchiveError> {
        if data.len() < Self::MIN_SIZE || !data.starts_with(Self::SIGNATURE) {
            return Err(ArchiveError::CorruptDirectory(
                "invalid ZIP64 end of central directory record".to_string(),
            ));
        }
        Ok(DirectoryLocation {
            entries: LittleEndian::read_u64(&data[32..]),
            size: LittleEndian::read_u64(&data[40..]),
            offset: LittleEndian::read_u64(&data[48..]),
        })
    }
}

/// Central directory file header, 46 bytes before the variable fields
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local file header, 30 bytes before the variable fields
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag bit marking an encrypted entry.
pub const FLAG_ENCRYPTED: u16 = 0x0001;

/// One central directory entry.
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub flags: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}
