//! ZIP archive parsing and entry extraction.
//!
//! An APK is a ZIP archive. Only two entries are ever needed from it, so the
//! archive is read from the end: the central directory is parsed up front and
//! entry data is fetched with positional reads on demand.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`reader`]: [`ArchiveReader`], the named-entry API used by extraction
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 end of central directory records and extra fields
//! - STORED (no compression) and DEFLATE methods, with size and CRC-32 checks
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod parser;
mod reader;
mod structures;

pub use parser::ZipParser;
pub use reader::{ArchiveReader, DEFAULT_MAX_ENTRY_SIZE};
pub use structures::*;
