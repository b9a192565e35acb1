use flate2::read::DeflateDecoder;
use std::io::Read;
use std::path::Path;

use crate::error::ArchiveError;
use crate::io::{LocalFileReader, ReadAt};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Default cap on the decompressed size of a single entry (64 MiB).
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Random access to the entries of a ZIP archive.
///
/// The central directory is read once when the reader is created; entry data
/// is only read when asked for.
pub struct ArchiveReader<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipFileEntry>,
    max_entry_size: u64,
}

impl ArchiveReader<LocalFileReader> {
    /// Open an archive on the local filesystem
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        Self::new(LocalFileReader::new(path)?)
    }
}

impl<R: ReadAt> ArchiveReader<R> {
    pub fn new(reader: R) -> Result<Self, ArchiveError> {
        Self::with_limit(reader, DEFAULT_MAX_ENTRY_SIZE)
    }

    /// Like [`ArchiveReader::new`], refusing entries that inflate past `max_entry_size` bytes
    pub fn with_limit(reader: R, max_entry_size: u64) -> Result<Self, ArchiveError> {
        let parser = ZipParser::new(reader);
        let entries = parser.list_files()?;
        Ok(Self {
            parser,
            entries,
            max_entry_size,
        })
    }

    /// List all files in the archive
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Look up an entry by its full name
    pub fn entry(&self, name: &str) -> Option<&ZipFileEntry> {
        self.entries.iter().find(|e| e.file_name == name)
    }

    /// Read and decompress the entry called `name`
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .entry(name)
            .ok_or_else(|| ArchiveError::EntryNotFound(name.to_string()))?;
        self.extract_to_memory(entry)
    }

    /// Extract file data to memory, checking its size and CRC-32
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>, ArchiveError> {
        let name = entry.file_name.as_str();

        if entry.uncompressed_size > self.max_entry_size {
            return Err(ArchiveError::EntryTooLarge {
                name: name.to_string(),
                size: entry.uncompressed_size,
                limit: self.max_entry_size,
            });
        }

        if entry.is_encrypted() {
            return Err(ArchiveError::corrupt_entry(name, "entry is encrypted"));
        }

        let data_offset = self.parser.get_data_offset(entry)?;
        let data_end = data_offset.checked_add(entry.compressed_size);
        if data_end.is_none_or(|end| end > self.parser.size()) {
            return Err(ArchiveError::corrupt_entry(
                name,
                "compressed data runs past end of archive",
            ));
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser.reader().read_exact_at(data_offset, &mut raw)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => {
                if entry.compressed_size != entry.uncompressed_size {
                    return Err(ArchiveError::corrupt_entry(
                        name,
                        format!(
                            "stored entry has compressed size {} but uncompressed size {}",
                            entry.compressed_size, entry.uncompressed_size
                        ),
                    ));
                }
                raw
            }
            CompressionMethod::Deflate => inflate(name, &raw, entry.uncompressed_size)?,
            CompressionMethod::Unknown(method) => {
                return Err(ArchiveError::UnsupportedCompression {
                    name: name.to_string(),
                    method,
                });
            }
        };

        let crc = crc32fast::hash(&data);
        if crc != entry.crc32 {
            return Err(ArchiveError::corrupt_entry(
                name,
                format!("CRC-32 mismatch: expected {:#010x}, got {:#010x}", entry.crc32, crc),
            ));
        }

        log::debug!(
            "read {} ({} bytes, {:?})",
            name,
            data.len(),
            entry.compression_method
        );

        Ok(data)
    }
}

fn inflate(name: &str, raw: &[u8], expected: u64) -> Result<Vec<u8>, ArchiveError> {
    // One byte past the declared size is enough to notice a lying header.
    let mut decoder = DeflateDecoder::new(raw).take(expected + 1);
    let mut out = Vec::with_capacity(expected as usize);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ArchiveError::corrupt_entry(name, format!("inflate failed: {e}")))?;

    if out.len() as u64 != expected {
        return Err(ArchiveError::corrupt_entry(
            name,
            format!("inflated to {} bytes, expected {}", out.len(), expected),
        ));
    }
    Ok(out)
}
