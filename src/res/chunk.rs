use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::ChunkError;

pub const RES_NULL_TYPE: u16 = 0x0000;
pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub const RES_TABLE_TYPE: u16 = 0x0002;
pub const RES_XML_TYPE: u16 = 0x0003;

pub const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
pub const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
pub const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
pub const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
pub const RES_XML_CDATA_TYPE: u16 = 0x0104;
pub const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;

pub const RES_TABLE_PACKAGE_TYPE: u16 = 0x0200;
pub const RES_TABLE_TYPE_TYPE: u16 = 0x0201;
pub const RES_TABLE_TYPE_SPEC_TYPE: u16 = 0x0202;
pub const RES_TABLE_LIBRARY_TYPE: u16 = 0x0203;

/// Index value meaning "no string".
pub const NO_INDEX: u32 = 0xFFFF_FFFF;

/// Map [`NO_INDEX`] to `None`.
pub fn optional_index(index: u32) -> Option<u32> {
    (index != NO_INDEX).then_some(index)
}

/// The `ResChunk_header` that prefixes every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: u16,
    pub header_size: u16,
    pub size: u32,
    /// Absolute offset of the chunk within the decoded buffer
    pub offset: usize,
}

impl ChunkHeader {
    pub const SIZE: usize = 8;

    /// Read the header at `offset`, requiring the whole chunk to end at or before `limit`.
    pub fn read(data: &[u8], offset: usize, limit: usize) -> Result<Self, ChunkError> {
        let limit = limit.min(data.len());
        if offset.saturating_add(Self::SIZE) > limit {
            return Err(ChunkError::TruncatedHeader { offset });
        }

        let raw = &data[offset..offset + Self::SIZE];
        let chunk_type = u16::from_le_bytes([raw[0], raw[1]]);
        let header_size = u16::from_le_bytes([raw[2], raw[3]]);
        let size = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);

        if (header_size as usize) < Self::SIZE || header_size as u32 > size {
            return Err(ChunkError::BadHeaderSize {
                offset,
                chunk_type,
                header_size,
                size,
            });
        }

        let available = limit - offset;
        if size as usize > available {
            return Err(ChunkError::Overflow {
                offset,
                chunk_type,
                size,
                available,
            });
        }

        Ok(Self {
            chunk_type,
            header_size,
            size,
            offset,
        })
    }

    /// Absolute offset one past the last byte of the chunk
    pub fn end(&self) -> usize {
        self.offset + self.size as usize
    }

    /// Absolute offset of the first byte after the header
    pub fn body_offset(&self) -> usize {
        self.offset + self.header_size as usize
    }

    pub fn expect(&self, chunk_type: u16) -> Result<(), ChunkError> {
        if self.chunk_type != chunk_type {
            return Err(ChunkError::UnexpectedType {
                offset: self.offset,
                expected: chunk_type,
                found: self.chunk_type,
            });
        }
        Ok(())
    }

    /// Fail unless the header declares at least `min` bytes.
    pub fn require_header_size(&self, min: usize) -> Result<(), ChunkError> {
        if (self.header_size as usize) < min {
            return Err(ChunkError::BadHeaderSize {
                offset: self.offset,
                chunk_type: self.chunk_type,
                header_size: self.header_size,
                size: self.size,
            });
        }
        Ok(())
    }
}

/// Walks sibling chunks laid out back to back in `[start, end)`.
pub struct ChunkIter<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    failed: bool,
}

impl<'a> ChunkIter<'a> {
    pub fn new(data: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            data,
            pos: start,
            end,
            failed: false,
        }
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = Result<ChunkHeader, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.end {
            return None;
        }
        match ChunkHeader::read(self.data, self.pos, self.end) {
            Ok(header) => {
                // header.size >= header_size >= 8, so this always advances
                self.pos = header.end();
                Some(Ok(header))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Little-endian reader confined to a single chunk.
///
/// Positions are relative to the chunk start; errors report absolute offsets.
pub struct ChunkReader<'a> {
    cursor: Cursor<&'a [u8]>,
    header: ChunkHeader,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8], header: &ChunkHeader) -> Self {
        Self {
            cursor: Cursor::new(&data[header.offset..header.end()]),
            header: *header,
        }
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    /// Absolute offset of the current position
    pub fn absolute(&self) -> usize {
        self.header.offset + self.position()
    }

    pub fn seek(&mut self, pos: usize) -> Result<(), ChunkError> {
        if pos > self.len() {
            return Err(self.truncated_at(pos));
        }
        self.cursor.set_position(pos as u64);
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, ChunkError> {
        let at = self.position();
        self.cursor.read_u8().map_err(|_| self.truncated_at(at))
    }

    pub fn read_u16(&mut self) -> Result<u16, ChunkError> {
        let at = self.position();
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated_at(at))
    }

    pub fn read_u32(&mut self) -> Result<u32, ChunkError> {
        let at = self.position();
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated_at(at))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ChunkError> {
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        let bytes = start
            .checked_add(len)
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| self.truncated_at(start))?;
        self.cursor.set_position((start + len) as u64);
        Ok(bytes)
    }

    /// Build an [`ChunkError::Invalid`] at the current position.
    pub fn invalid(&self, reason: impl Into<String>) -> ChunkError {
        ChunkError::invalid(self.absolute(), self.header.chunk_type, reason)
    }

    fn truncated_at(&self, pos: usize) -> ChunkError {
        ChunkError::Truncated {
            offset: self.header.offset + pos,
            chunk_type: self.header.chunk_type,
        }
    }
}
