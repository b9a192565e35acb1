use std::collections::HashMap;

use crate::error::ChunkError;

use super::chunk::{ChunkHeader, ChunkReader, NO_INDEX, RES_STRING_POOL_TYPE};

const UTF8_FLAG: u32 = 0x0000_0100;
const HEADER_SIZE: usize = 28;
/// Worst-case growth from stored bytes to decoded UTF-8 (one invalid byte
/// becomes a three-byte U+FFFD).
const MAX_EXPANSION: usize = 3;

/// A decoded `ResStringPool` chunk.
///
/// Strings are decoded eagerly, once per distinct offset; style spans are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringPool {
    strings: Vec<String>,
    /// Pool index to slot in `strings`
    slots: Vec<u32>,
    utf8: bool,
}

impl StringPool {
    pub fn parse(data: &[u8], header: &ChunkHeader) -> Result<Self, ChunkError> {
        header.expect(RES_STRING_POOL_TYPE)?;
        header.require_header_size(HEADER_SIZE)?;

        let mut reader = ChunkReader::new(data, header);
        reader.seek(ChunkHeader::SIZE)?;
        let string_count = reader.read_u32()? as usize;
        let _style_count = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let strings_start = reader.read_u32()? as usize;
        let _styles_start = reader.read_u32()?;
        let utf8 = flags & UTF8_FLAG != 0;

        reader.seek(header.header_size as usize)?;
        if string_count > reader.remaining() / 4 {
            return Err(reader.invalid(format!(
                "{string_count} string offsets do not fit in the chunk"
            )));
        }
        let mut offsets = Vec::with_capacity(string_count);
        for _ in 0..string_count {
            offsets.push(reader.read_u32()? as usize);
        }

        if string_count > 0 && strings_start >= reader.len() {
            return Err(reader.invalid(format!(
                "string data starts at {strings_start:#x}, past the chunk end"
            )));
        }

        // Offsets may be shared or overlap, so the decoded total is capped by
        // what the chunk itself could legitimately hold.
        let budget = reader.len().saturating_mul(MAX_EXPANSION);
        let mut decoded = 0usize;
        let mut seen: HashMap<usize, u32> = HashMap::new();
        let mut strings = Vec::new();
        let mut slots = Vec::with_capacity(string_count);
        for offset in offsets {
            if let Some(&slot) = seen.get(&offset) {
                slots.push(slot);
                continue;
            }
            let Some(pos) = strings_start.checked_add(offset) else {
                return Err(reader.invalid("string offset overflows"));
            };
            reader.seek(pos)?;
            let text = if utf8 {
                read_utf8(&mut reader)?
            } else {
                read_utf16(&mut reader)?
            };
            decoded += text.len();
            if decoded > budget {
                return Err(reader.invalid(format!(
                    "strings decode to more than {budget} bytes"
                )));
            }
            let slot = strings.len() as u32;
            seen.insert(offset, slot);
            slots.push(slot);
            strings.push(text);
        }

        Ok(Self {
            strings,
            slots,
            utf8,
        })
    }

    /// The string at `index`, or `None` for [`NO_INDEX`] and out-of-range indices.
    pub fn get(&self, index: u32) -> Option<&str> {
        if index == NO_INDEX {
            return None;
        }
        let slot = *self.slots.get(index as usize)?;
        self.strings.get(slot as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_utf8(&self) -> bool {
        self.utf8
    }
}

fn read_utf8(reader: &mut ChunkReader<'_>) -> Result<String, ChunkError> {
    let _char_len = read_utf8_length(reader)?;
    let byte_len = read_utf8_length(reader)?;
    let bytes = reader.read_bytes(byte_len)?;
    Ok(decode_utf8(bytes))
}

/// aapt writes modified UTF-8 for characters outside the BMP, so plain UTF-8
/// decoding is tried first, then Java CESU-8.
fn decode_utf8(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    match cesu8::from_java_cesu8(bytes) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn read_utf16(reader: &mut ChunkReader<'_>) -> Result<String, ChunkError> {
    let len = read_utf16_length(reader)?;
    let Some(byte_len) = len.checked_mul(2) else {
        return Err(reader.invalid("UTF-16 string length overflows"));
    };
    let bytes = reader.read_bytes(byte_len)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}

fn read_utf8_length(reader: &mut ChunkReader<'_>) -> Result<usize, ChunkError> {
    let first = reader.read_u8()?;
    if first & 0x80 == 0 {
        return Ok(first as usize);
    }
    let second = reader.read_u8()?;
    Ok((((first & 0x7F) as usize) << 8) | second as usize)
}

fn read_utf16_length(reader: &mut ChunkReader<'_>) -> Result<usize, ChunkError> {
    let first = reader.read_u16()?;
    if first & 0x8000 == 0 {
        return Ok(first as usize);
    }
    let second = reader.read_u16()?;
    Ok((((first & 0x7FFF) as usize) << 16) | second as usize)
}
