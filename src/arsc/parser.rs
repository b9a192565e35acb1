//! Decoding of `resources.arsc`.
//!
//! ```text
//! TABLE
//! ├── STRING_POOL            global values
//! └── PACKAGE*
//!     ├── STRING_POOL        type names  (at header.typeStrings)
//!     ├── STRING_POOL        key names   (at header.keyStrings)
//!     ├── TYPE_SPEC*
//!     └── TYPE*              one per configuration variant
//! ```
//!
//! Every other chunk kind (library, overlayable, staged alias) is skipped by
//! its declared size.

use std::collections::BTreeMap;

use crate::error::{ArscFormatError, ChunkError};
use crate::res::chunk::*;
use crate::res::{ResValue, ResourceId, StringPool};

use super::structures::*;
use super::table::ArscTable;

const TABLE_HEADER_SIZE: usize = 12;
/// `ResTable_package` without the trailing `typeIdOffset`
const PACKAGE_HEADER_SIZE: usize = 284;
const TYPE_SPEC_HEADER_SIZE: usize = 16;
/// Fixed part of `ResTable_type` plus the config's own size field
const TYPE_HEADER_SIZE: usize = 24;
const CONFIG_OFFSET: usize = 20;

const NO_ENTRY: u32 = 0xFFFF_FFFF;
const NO_ENTRY16: u16 = 0xFFFF;

const ENTRY_FLAG_COMPLEX: u16 = 0x0001;
const ENTRY_FLAG_COMPACT: u16 = 0x0008;
const ENTRY_HEADER_SIZE: usize = 8;

pub(super) fn parse(data: &[u8]) -> Result<ArscTable, ArscFormatError> {
    let header = ChunkHeader::read(data, 0, data.len())?;
    header.expect(RES_TABLE_TYPE)?;
    header.require_header_size(TABLE_HEADER_SIZE)?;

    let mut reader = ChunkReader::new(data, &header);
    reader.seek(ChunkHeader::SIZE)?;
    let package_count = reader.read_u32()?;

    let mut strings = None;
    let mut packages = Vec::new();

    for chunk in ChunkIter::new(data, header.body_offset(), header.end()) {
        let chunk = chunk?;
        match chunk.chunk_type {
            RES_STRING_POOL_TYPE if strings.is_none() => {
                strings = Some(StringPool::parse(data, &chunk)?);
            }
            RES_TABLE_PACKAGE_TYPE => packages.push(parse_package(data, &chunk)?),
            other => {
                log::debug!(
                    "skipping table chunk {:#06x} ({} bytes) at {:#x}",
                    other,
                    chunk.size,
                    chunk.offset
                );
            }
        }
    }

    let strings = strings.ok_or_else(|| {
        ChunkError::invalid(header.offset, header.chunk_type, "table has no global string pool")
    })?;

    if packages.len() != package_count as usize {
        log::debug!(
            "table declares {} packages but holds {}",
            package_count,
            packages.len()
        );
    }

    Ok(ArscTable { strings, packages })
}

fn parse_package(data: &[u8], header: &ChunkHeader) -> Result<Package, ChunkError> {
    header.require_header_size(PACKAGE_HEADER_SIZE)?;

    let mut reader = ChunkReader::new(data, header);
    reader.seek(ChunkHeader::SIZE)?;
    let raw_id = reader.read_u32()?;
    let id = u8::try_from(raw_id)
        .map_err(|_| reader.invalid(format!("package id {raw_id:#x} does not fit in a byte")))?;

    let mut name = Vec::with_capacity(128);
    for _ in 0..128 {
        name.push(reader.read_u16()?);
    }
    let name_len = name.iter().position(|&c| c == 0).unwrap_or(name.len());
    let name = String::from_utf16_lossy(&name[..name_len]);

    let type_strings = reader.read_u32()? as usize;
    let _last_public_type = reader.read_u32()?;
    let key_strings = reader.read_u32()? as usize;
    let _last_public_key = reader.read_u32()?;

    let mut types_pool = None;
    let mut keys_pool = None;
    let mut specs = Vec::new();
    let mut types = Vec::new();

    for chunk in ChunkIter::new(data, header.body_offset(), header.end()) {
        let chunk = chunk?;
        match chunk.chunk_type {
            RES_STRING_POOL_TYPE => {
                let relative = chunk.offset - header.offset;
                let pool = StringPool::parse(data, &chunk)?;
                if relative == type_strings {
                    types_pool = Some(pool);
                } else if relative == key_strings {
                    keys_pool = Some(pool);
                } else if types_pool.is_none() {
                    types_pool = Some(pool);
                } else if keys_pool.is_none() {
                    keys_pool = Some(pool);
                } else {
                    log::debug!("ignoring extra string pool at {:#x}", chunk.offset);
                }
            }
            RES_TABLE_TYPE_SPEC_TYPE => specs.push(parse_type_spec(data, &chunk)?),
            RES_TABLE_TYPE_TYPE => types.push(parse_type(data, &chunk)?),
            other => {
                log::debug!(
                    "skipping package chunk {:#06x} ({} bytes) at {:#x}",
                    other,
                    chunk.size,
                    chunk.offset
                );
            }
        }
    }

    log::debug!(
        "package {:#04x} `{}`: {} type specs, {} type chunks",
        id,
        name,
        specs.len(),
        types.len()
    );

    Ok(Package {
        id,
        name,
        type_strings: types_pool.unwrap_or_default(),
        key_strings: keys_pool.unwrap_or_default(),
        specs,
        types,
    })
}

fn parse_type_spec(data: &[u8], header: &ChunkHeader) -> Result<TypeSpec, ChunkError> {
    header.require_header_size(TYPE_SPEC_HEADER_SIZE)?;

    let mut reader = ChunkReader::new(data, header);
    reader.seek(ChunkHeader::SIZE)?;
    let id = reader.read_u8()?;
    let _res0 = reader.read_u8()?;
    let _types_count = reader.read_u16()?;
    let entry_count = reader.read_u32()?;

    reader.seek(header.header_size as usize)?;
    if entry_count as usize > reader.remaining() / 4 {
        return Err(reader.invalid(format!("{entry_count} spec flags do not fit in the chunk")));
    }
    let mut flags = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        flags.push(reader.read_u32()?);
    }

    Ok(TypeSpec {
        id,
        entry_count,
        flags,
    })
}

fn parse_type(data: &[u8], header: &ChunkHeader) -> Result<TypeChunk, ChunkError> {
    header.require_header_size(TYPE_HEADER_SIZE)?;

    let mut reader = ChunkReader::new(data, header);
    reader.seek(ChunkHeader::SIZE)?;
    let id = reader.read_u8()?;
    let flags = reader.read_u8()?;
    let _reserved = reader.read_u16()?;
    let entry_count = reader.read_u32()?;
    let entries_start = reader.read_u32()? as usize;

    // The config is whatever the header holds past the fixed fields, further
    // limited by its own size field.
    let header_size = header.header_size as usize;
    reader.seek(CONFIG_OFFSET)?;
    let config_size = reader.read_u32()? as usize;
    reader.seek(CONFIG_OFFSET)?;
    let config_bytes = reader.read_bytes(config_size.min(header_size - CONFIG_OFFSET))?;
    let config = ResConfig::from_bytes(config_bytes);

    if entries_start > reader.len() {
        return Err(reader.invalid(format!(
            "entries start at {entries_start:#x}, past the chunk end"
        )));
    }

    reader.seek(header_size)?;
    let slots = read_entry_offsets(&mut reader, flags, entry_count)?;

    let mut entries = BTreeMap::new();
    for (index, offset) in slots {
        let Some(pos) = entries_start.checked_add(offset) else {
            return Err(reader.invalid("entry offset overflows"));
        };
        reader.seek(pos)?;
        entries.insert(index, parse_entry(&mut reader, pos)?);
    }

    Ok(TypeChunk {
        id,
        flags,
        config,
        entry_count,
        entries,
    })
}

/// Read the offset table at the reader's position as (entry index, byte offset) pairs.
fn read_entry_offsets(
    reader: &mut ChunkReader<'_>,
    flags: u8,
    entry_count: u32,
) -> Result<Vec<(u16, usize)>, ChunkError> {
    let count = entry_count as usize;
    let width = if flags & TypeChunk::FLAG_SPARSE != 0 {
        4
    } else if flags & TypeChunk::FLAG_OFFSET16 != 0 {
        2
    } else {
        4
    };
    if count > reader.remaining() / width {
        return Err(reader.invalid(format!("{count} entry offsets do not fit in the chunk")));
    }
    if flags & TypeChunk::FLAG_SPARSE == 0 && count > u16::MAX as usize + 1 {
        return Err(reader.invalid(format!("{count} entries exceed the 16-bit index space")));
    }

    let mut slots = Vec::new();
    for i in 0..count {
        if flags & TypeChunk::FLAG_SPARSE != 0 {
            let index = reader.read_u16()?;
            let offset = reader.read_u16()? as usize * 4;
            slots.push((index, offset));
        } else if flags & TypeChunk::FLAG_OFFSET16 != 0 {
            let offset = reader.read_u16()?;
            if offset != NO_ENTRY16 {
                slots.push((i as u16, offset as usize * 4));
            }
        } else {
            let offset = reader.read_u32()?;
            if offset != NO_ENTRY {
                slots.push((i as u16, offset as usize));
            }
        }
    }
    Ok(slots)
}

fn parse_entry(reader: &mut ChunkReader<'_>, pos: usize) -> Result<Entry, ChunkError> {
    let size = reader.read_u16()?;
    let flags = reader.read_u16()?;
    let key = reader.read_u32()?;

    if flags & ENTRY_FLAG_COMPACT != 0 {
        // {key:16, flags:16, data:32}; the value type lives in the high byte of flags
        let data_type = (flags >> 8) as u8;
        return Ok(Entry::Simple {
            key: size as u32,
            value: ResValue::decode(data_type, key),
        });
    }

    if (size as usize) < ENTRY_HEADER_SIZE {
        return Err(reader.invalid(format!("entry declares size {size}")));
    }

    if flags & ENTRY_FLAG_COMPLEX != 0 {
        let parent = reader.read_u32()?;
        let count = reader.read_u32()?;
        return Ok(Entry::Complex {
            key,
            parent: (parent != 0).then_some(ResourceId(parent)),
            count,
        });
    }

    reader.seek(pos + size as usize)?;
    let value = ResValue::read(reader)?;
    Ok(Entry::Simple { key, value })
}
