//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! Every offset and length taken from the archive is checked against the
//! source size before anything is read or allocated.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

use crate::error::ArchiveError;
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Typically used through [`ArchiveReader`](super::ArchiveReader)
/// rather than directly.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: R,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    /// Create a new parser for the given reader.
    pub fn new(reader: R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The EOCD is located at the end of the ZIP file. This method
    /// handles both the simple case (no comment) and archives with
    /// comments by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in file).
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotAZip`] if no valid EOCD can be found.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64), ArchiveError> {
        if self.size < EndOfCentralDirectory::SIZE as u64 {
            return Err(ArchiveError::NotAZip);
        }

        // First try the common case where there's no comment.
        let offset = self.size - EndOfCentralDirectory::SIZE as u64;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf)?;

        if let Some(eocd) = EndOfCentralDirectory::from_bytes(&buf)
            && eocd.comment_len == 0
        {
            return Ok((eocd, offset));
        }

        // The EOCD could be earlier if there's a ZIP comment.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf)?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            // The comment length must account for exactly the remaining bytes.
            if let Some(eocd) = EndOfCentralDirectory::from_bytes(&buf[i..])
                && eocd.comment_len as usize == buf.len() - i - EndOfCentralDirectory::SIZE
            {
                return Ok((eocd, search_start + i as u64));
            }
        }

        Err(ArchiveError::NotAZip)
    }

    /// Locate the central directory described by the end record at `eocd_offset`.
    ///
    /// When the classic record has saturated fields the ZIP64 record, found
    /// through the locator right before it, is authoritative.
    pub fn directory_location(
        &self,
        eocd: &EndOfCentralDirectory,
        eocd_offset: u64,
    ) -> Result<DirectoryLocation, ArchiveError> {
        if !eocd.is_zip64() {
            return Ok(eocd.location());
        }

        let locator_offset = eocd_offset
            .checked_sub(Zip64Locator::SIZE as u64)
            .ok_or_else(|| {
                ArchiveError::CorruptDirectory("missing ZIP64 end of central directory locator".into())
            })?;
        let mut locator_buf = [0u8; Zip64Locator::SIZE];
        self.reader.read_exact_at(locator_offset, &mut locator_buf)?;
        let record_offset = Zip64Locator::record_offset(&locator_buf)?;

        if record_offset.saturating_add(Zip64EndOfCentralDirectory::MIN_SIZE as u64) > locator_offset {
            return Err(ArchiveError::CorruptDirectory(
                "ZIP64 end of central directory record out of bounds".into(),
            ));
        }

        let mut record_buf = [0u8; Zip64EndOfCentralDirectory::MIN_SIZE];
        self.reader.read_exact_at(record_offset, &mut record_buf)?;
        Zip64EndOfCentralDirectory::location(&record_buf)
    }

    /// List all files in the ZIP archive.
    ///
    /// Reads the EOCD first, then fetches and parses the entire Central Directory.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>, ArchiveError> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let location = self.directory_location(&eocd, eocd_offset)?;
        let DirectoryLocation {
            offset: cd_offset,
            size: cd_size,
            entries: total_entries,
        } = location;

        let cd_end = location.end().ok_or_else(|| {
            ArchiveError::CorruptDirectory("central directory size overflows".into())
        })?;
        if cd_end > eocd_offset {
            return Err(ArchiveError::CorruptDirectory(format!(
                "central directory [{cd_offset:#x}, {cd_end:#x}) runs past the end record at {eocd_offset:#x}"
            )));
        }
        if total_entries > cd_size / CDFH_MIN_SIZE as u64 {
            return Err(ArchiveError::CorruptDirectory(format!(
                "{total_entries} entries cannot fit in a {cd_size} byte central directory"
            )));
        }

        // Read the entire Central Directory in one request
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data)?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for index in 0..total_entries {
            let entry = Self::parse_cdfh(&mut cursor).map_err(|e| {
                ArchiveError::CorruptDirectory(format!("central directory entry {index}: {e}"))
            })?;
            entries.push(entry);
        }

        log::debug!(
            "central directory at {:#x} lists {} entries",
            cd_offset,
            entries.len()
        );

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    ///
    /// The CDFH contains metadata about a file in the archive, including
    /// its name, sizes, and location of the actual file data.
    fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> io::Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid central directory file header signature",
            ));
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Use lossy conversion to handle non-UTF8 filenames gracefully
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        let is_directory = file_name.ends_with('/');

        // ZIP64 extended information lives in extra field 0x0001
        let extra_field_end = cursor.position() + extra_field_length as u64;

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = cursor.position() + field_size as u64;

            if header_id == 0x0001 {
                // Fields are present only if corresponding header field is 0xFFFFFFFF
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>()?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>()?;
                }
            }
            cursor.set_position(field_end);
        }

        // Skip over the rest of the extra field and the file comment
        let entry_end = extra_field_end + file_comment_length as u64;
        if entry_end > cursor.get_ref().len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "entry runs past end of central directory",
            ));
        }
        cursor.set_position(entry_end);

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            flags,
            is_directory,
        })
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header (LFH) has variable-length fields (filename,
    /// extra field) that may differ from the Central Directory entry.
    /// This method reads the LFH to calculate where the actual file
    /// data begins.
    pub fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64, ArchiveError> {
        if entry.lfh_offset.saturating_add(LFH_SIZE as u64) > self.size {
            return Err(ArchiveError::corrupt_entry(
                &entry.file_name,
                "local file header lies outside the archive",
            ));
        }

        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf)?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::corrupt_entry(
                &entry.file_name,
                "invalid local file header signature",
            ));
        }

        // Read the variable field lengths from fixed positions in LFH
        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26);

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        // Data starts after: LFH (30 bytes) + filename + extra field
        let data_offset =
            entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length;

        Ok(data_offset)
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Total size of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}
