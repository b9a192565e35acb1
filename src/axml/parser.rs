//! Chunk-by-chunk decoding of a binary XML document.
//!
//! The outer `RES_XML_TYPE` chunk holds a flat stream: a string pool, an
//! optional resource map, then namespace/element/CDATA nodes. Nodes reference
//! the string pool, so the pool must come first.

use crate::error::{AxmlFormatError, ChunkError};
use crate::res::chunk::*;
use crate::res::{ResValue, ResourceId, StringPool, optional_index};

use super::document::AxmlDocument;
use super::structures::*;

/// Fixed header of every node chunk: chunk header, line number, comment index.
const NODE_HEADER_SIZE: usize = 16;
const MIN_ATTRIBUTE_SIZE: usize = 20;

pub(super) fn parse(data: &[u8]) -> Result<AxmlDocument, AxmlFormatError> {
    let header = ChunkHeader::read(data, 0, data.len())?;
    header.expect(RES_XML_TYPE)?;

    let mut strings: Option<StringPool> = None;
    let mut resource_map = Vec::new();
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    for chunk in ChunkIter::new(data, header.body_offset(), header.end()) {
        let chunk = chunk?;
        match chunk.chunk_type {
            RES_STRING_POOL_TYPE => {
                if strings.is_some() {
                    log::debug!("ignoring extra string pool at {:#x}", chunk.offset);
                    continue;
                }
                strings = Some(StringPool::parse(data, &chunk)?);
            }
            RES_XML_RESOURCE_MAP_TYPE => {
                resource_map = parse_resource_map(data, &chunk)?;
            }
            RES_XML_START_NAMESPACE_TYPE..=RES_XML_CDATA_TYPE => {
                if strings.is_none() {
                    return Err(ChunkError::invalid(
                        chunk.offset,
                        chunk.chunk_type,
                        "node appears before the string pool",
                    )
                    .into());
                }
                let node = parse_node(data, &chunk, &resource_map)?;
                match &node {
                    XmlChunk::StartTag(_) => {
                        if depth == 0 && seen_root {
                            return Err(ChunkError::invalid(
                                chunk.offset,
                                chunk.chunk_type,
                                "second root element",
                            )
                            .into());
                        }
                        depth += 1;
                        seen_root = true;
                    }
                    XmlChunk::EndTag(_) => {
                        depth = depth.checked_sub(1).ok_or_else(|| {
                            ChunkError::invalid(
                                chunk.offset,
                                chunk.chunk_type,
                                "end tag without a matching start tag",
                            )
                        })?;
                    }
                    _ => {}
                }
                chunks.push(node);
            }
            other => {
                log::debug!(
                    "skipping unknown XML chunk {:#06x} ({} bytes) at {:#x}",
                    other,
                    chunk.size,
                    chunk.offset
                );
            }
        }
    }

    let strings = strings.ok_or_else(|| {
        ChunkError::invalid(header.offset, header.chunk_type, "document has no string pool")
    })?;
    if !seen_root {
        return Err(
            ChunkError::invalid(header.offset, header.chunk_type, "document has no root element")
                .into(),
        );
    }
    if depth != 0 {
        return Err(ChunkError::invalid(
            header.end(),
            header.chunk_type,
            format!("{depth} element(s) left unclosed"),
        )
        .into());
    }

    log::debug!(
        "decoded binary XML: {} strings, {} resource ids, {} nodes",
        strings.len(),
        resource_map.len(),
        chunks.len()
    );

    Ok(AxmlDocument {
        strings,
        resource_map,
        chunks,
    })
}

fn parse_resource_map(data: &[u8], header: &ChunkHeader) -> Result<Vec<ResourceId>, ChunkError> {
    let mut reader = ChunkReader::new(data, header);
    reader.seek(header.header_size as usize)?;
    let count = reader.remaining() / 4;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(ResourceId(reader.read_u32()?));
    }
    Ok(ids)
}

fn parse_node(
    data: &[u8],
    header: &ChunkHeader,
    resource_map: &[ResourceId],
) -> Result<XmlChunk, ChunkError> {
    header.require_header_size(NODE_HEADER_SIZE)?;

    let mut reader = ChunkReader::new(data, header);
    reader.seek(ChunkHeader::SIZE)?;
    let line = reader.read_u32()?;
    let _comment = reader.read_u32()?;

    let ext = header.header_size as usize;
    reader.seek(ext)?;

    let node = match header.chunk_type {
        RES_XML_START_NAMESPACE_TYPE | RES_XML_END_NAMESPACE_TYPE => {
            let ns = Namespace {
                line,
                prefix: optional_index(reader.read_u32()?),
                uri: optional_index(reader.read_u32()?),
            };
            if header.chunk_type == RES_XML_START_NAMESPACE_TYPE {
                XmlChunk::StartNamespace(ns)
            } else {
                XmlChunk::EndNamespace(ns)
            }
        }
        RES_XML_START_ELEMENT_TYPE => {
            XmlChunk::StartTag(parse_start_tag(&mut reader, line, ext, resource_map)?)
        }
        RES_XML_END_ELEMENT_TYPE => XmlChunk::EndTag(EndTag {
            line,
            namespace: optional_index(reader.read_u32()?),
            name: reader.read_u32()?,
        }),
        RES_XML_CDATA_TYPE => XmlChunk::CData(CData {
            line,
            data: optional_index(reader.read_u32()?),
            value: ResValue::read(&mut reader)?,
        }),
        other => {
            return Err(ChunkError::invalid(
                header.offset,
                other,
                "not a node chunk",
            ));
        }
    };
    Ok(node)
}

fn parse_start_tag(
    reader: &mut ChunkReader<'_>,
    line: u32,
    ext: usize,
    resource_map: &[ResourceId],
) -> Result<StartTag, ChunkError> {
    let namespace = optional_index(reader.read_u32()?);
    let name = reader.read_u32()?;
    let attribute_start = reader.read_u16()? as usize;
    let attribute_size = reader.read_u16()? as usize;
    let attribute_count = reader.read_u16()? as usize;

    if attribute_count > 0 && attribute_size < MIN_ATTRIBUTE_SIZE {
        return Err(reader.invalid(format!("attribute size {attribute_size} is too small")));
    }

    let first = ext + attribute_start;
    let needed = attribute_count * attribute_size;
    if first.saturating_add(needed) > reader.len() {
        return Err(reader.invalid(format!(
            "{attribute_count} attributes of {attribute_size} bytes overrun the element"
        )));
    }

    let mut attributes = Vec::with_capacity(attribute_count);
    for i in 0..attribute_count {
        reader.seek(first + i * attribute_size)?;
        let namespace = optional_index(reader.read_u32()?);
        let name = reader.read_u32()?;
        let raw_value = optional_index(reader.read_u32()?);
        let value = ResValue::read(reader)?;
        attributes.push(Attribute {
            namespace,
            name,
            resource_id: resource_map.get(name as usize).copied(),
            raw_value,
            value,
        });
    }

    Ok(StartTag {
        line,
        namespace,
        name,
        attributes,
    })
}
