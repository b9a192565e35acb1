use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use super::{write_u16, write_u32};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Stored,
    Deflated,
}

struct CentralRecord {
    name: String,
    method: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    local_header_offset: u32,
}

/// A complete zip archive holding `entries` in order, without a comment.
pub fn zip_archive(entries: &[(&str, &[u8], Method)]) -> Vec<u8> {
    build_archive(entries, false)
}

/// Like [`zip_archive`], but every central directory entry defers its sizes
/// and offset to a `0x0001` extra field and the directory is described by a
/// ZIP64 end record and locator, with the classic end record saturated.
pub fn zip64_archive(entries: &[(&str, &[u8], Method)]) -> Vec<u8> {
    build_archive(entries, true)
}

fn build_archive(entries: &[(&str, &[u8], Method)], zip64: bool) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut records = Vec::with_capacity(entries.len());

    for (name, data, method) in entries {
        records.push(write_local_entry(&mut buf, name, data, *method));
    }

    let central_offset = buf.len() as u32;
    for record in &records {
        write_central_directory_entry(&mut buf, record, zip64);
    }
    let central_size = buf.len() as u32 - central_offset;

    if zip64 {
        let record_offset = buf.len() as u64;
        write_u32(&mut buf, 0x06064b50);
        write_u64(&mut buf, 44); // size of the remaining record
        write_u16(&mut buf, 45);
        write_u16(&mut buf, 45);
        write_u32(&mut buf, 0);
        write_u32(&mut buf, 0);
        write_u64(&mut buf, records.len() as u64);
        write_u64(&mut buf, records.len() as u64);
        write_u64(&mut buf, central_size as u64);
        write_u64(&mut buf, central_offset as u64);

        write_u32(&mut buf, 0x07064b50);
        write_u32(&mut buf, 0);
        write_u64(&mut buf, record_offset);
        write_u32(&mut buf, 1);
    }

    let (count, size, offset) = if zip64 {
        (u16::MAX, u32::MAX, u32::MAX)
    } else {
        (records.len() as u16, central_size, central_offset)
    };
    write_u32(&mut buf, 0x06054b50);
    write_u16(&mut buf, 0);
    write_u16(&mut buf, 0);
    write_u16(&mut buf, count);
    write_u16(&mut buf, count);
    write_u32(&mut buf, size);
    write_u32(&mut buf, offset);
    write_u16(&mut buf, 0);
    buf
}

fn write_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_local_entry(buf: &mut Vec<u8>, name: &str, data: &[u8], method: Method) -> CentralRecord {
    let offset = buf.len() as u32;
    let (compressed, method) = match method {
        Method::Stored => (data.to_vec(), 0u16),
        Method::Deflated => (deflate_bytes(data), 8u16),
    };
    let crc32 = crc32fast::hash(data);

    write_u32(buf, 0x04034b50);
    write_u16(buf, 20);
    write_u16(buf, 0);
    write_u16(buf, method);
    write_u16(buf, 0);
    write_u16(buf, 0);
    write_u32(buf, crc32);
    write_u32(buf, compressed.len() as u32);
    write_u32(buf, data.len() as u32);
    write_u16(buf, name.len() as u16);
    write_u16(buf, 0);
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&compressed);

    CentralRecord {
        name: name.to_string(),
        method,
        crc32,
        compressed_size: compressed.len() as u32,
        uncompressed_size: data.len() as u32,
        local_header_offset: offset,
    }
}

fn write_central_directory_entry(buf: &mut Vec<u8>, record: &CentralRecord, zip64: bool) {
    let saturated = |value: u32| if zip64 { u32::MAX } else { value };

    write_u32(buf, 0x02014b50);
    write_u16(buf, 0x031E);
    write_u16(buf, if zip64 { 45 } else { 20 });
    write_u16(buf, 0);
    write_u16(buf, record.method);
    write_u16(buf, 0);
    write_u16(buf, 0);
    write_u32(buf, record.crc32);
    write_u32(buf, saturated(record.compressed_size));
    write_u32(buf, saturated(record.uncompressed_size));
    write_u16(buf, record.name.len() as u16);
    write_u16(buf, if zip64 { 4 + 24 } else { 0 });
    write_u16(buf, 0);
    write_u16(buf, 0);
    write_u16(buf, 0);
    write_u32(buf, 0);
    write_u32(buf, saturated(record.local_header_offset));
    buf.extend_from_slice(record.name.as_bytes());
    if zip64 {
        // Extended fields in their fixed order: uncompressed, compressed, offset
        write_u16(buf, 0x0001);
        write_u16(buf, 24);
        write_u64(buf, record.uncompressed_size as u64);
        write_u64(buf, record.compressed_size as u64);
        write_u64(buf, record.local_header_offset as u64);
    }
}

fn deflate_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
