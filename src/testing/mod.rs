//! Fixture builders shared by unit tests.
//!
//! Everything here writes the binary formats by hand so tests can describe an
//! APK in a few lines and then corrupt exactly the bytes they care about.

mod arsc;
mod zip;

pub use arsc::*;
pub use axml::*;
pub use zip::*;

pub(crate) fn write_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub(crate) fn write_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn align_to_four(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Start a chunk with a placeholder size; pair with [`finish_chunk`].
pub(crate) fn begin_chunk(buf: &mut Vec<u8>, chunk_type: u16, header_size: u16) -> usize {
    let start = buf.len();
    write_u16(buf, chunk_type);
    write_u16(buf, header_size);
    write_u32(buf, 0);
    start
}

pub(crate) fn finish_chunk(buf: &mut Vec<u8>, start: usize) {
    align_to_four(buf);
    let size = (buf.len() - start) as u32;
    buf[start + 4..start + 8].copy_from_slice(&size.to_le_bytes());
}

/// A UTF-16 string pool chunk holding `strings` in order.
pub fn string_pool_chunk(strings: &[&str]) -> Vec<u8> {
    pool_chunk(strings, false)
}

/// A UTF-8 string pool chunk holding `strings` in order.
pub fn string_pool_chunk_utf8(strings: &[&str]) -> Vec<u8> {
    pool_chunk(strings, true)
}

pub(crate) fn pool_chunk<S: AsRef<str>>(strings: &[S], utf8: bool) -> Vec<u8> {
    let header_size = 28u16;
    let mut data = Vec::new();
    let mut offsets = Vec::with_capacity(strings.len());
    for s in strings {
        offsets.push(data.len() as u32);
        if utf8 {
            write_utf8_string(&mut data, s.as_ref());
        } else {
            write_utf16_string(&mut data, s.as_ref());
        }
    }
    align_to_four(&mut data);

    let mut chunk = Vec::new();
    let start = begin_chunk(&mut chunk, 0x0001, header_size);
    write_u32(&mut chunk, strings.len() as u32);
    write_u32(&mut chunk, 0); // style count
    write_u32(&mut chunk, if utf8 { 0x100 } else { 0 });
    write_u32(&mut chunk, header_size as u32 + strings.len() as u32 * 4);
    write_u32(&mut chunk, 0); // styles start
    for offset in offsets {
        write_u32(&mut chunk, offset);
    }
    chunk.extend_from_slice(&data);
    finish_chunk(&mut chunk, start);
    chunk
}

fn write_utf8_length(buf: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        write_u8(buf, len as u8);
    } else {
        write_u8(buf, 0x80 | (len >> 8) as u8);
        write_u8(buf, len as u8);
    }
}

fn write_utf8_string(buf: &mut Vec<u8>, text: &str) {
    write_utf8_length(buf, text.chars().count());
    write_utf8_length(buf, text.len());
    buf.extend_from_slice(text.as_bytes());
    write_u8(buf, 0);
}

fn write_utf16_string(buf: &mut Vec<u8>, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();
    if len < 0x8000 {
        write_u16(buf, len as u16);
    } else {
        write_u16(buf, 0x8000 | (len >> 16) as u16);
        write_u16(buf, len as u16);
    }
    for unit in units {
        write_u16(buf, unit);
    }
    write_u16(buf, 0);
}
