//! Error types for every stage of extraction.
//!
//! Structural failures in the container or the manifest are fatal and surface as
//! [`ExtractionError`]. Failures while resolving the application label are reported as
//! [`NotFoundError`] and only ever degrade the result.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::res::ResourceId;

/// Errors raised while reading the zip container.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not a zip archive: end of central directory record not found")]
    NotAZip,

    #[error("corrupt central directory: {0}")]
    CorruptDirectory(String),

    #[error("entry `{0}` not found in archive")]
    EntryNotFound(String),

    #[error("corrupt entry `{name}`: {reason}")]
    CorruptEntry { name: String, reason: String },

    #[error("entry `{name}` uses unsupported compression method {method}")]
    UnsupportedCompression { name: String, method: u16 },

    #[error("entry `{name}` is {size} bytes, over the {limit} byte limit")]
    EntryTooLarge { name: String, size: u64, limit: u64 },
}

impl ArchiveError {
    pub(crate) fn corrupt_entry(name: &str, reason: impl Into<String>) -> Self {
        Self::CorruptEntry {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// The archive is a zip but lacks an entry every APK must have.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not a valid APK: `{entry}` is missing")]
pub struct InvalidApkError {
    pub entry: String,
}

/// A structural violation inside a chunk-based resource file.
///
/// Offsets are absolute within the decoded buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("truncated chunk header at offset {offset:#x}")]
    TruncatedHeader { offset: usize },

    #[error(
        "chunk {chunk_type:#06x} at offset {offset:#x} declares {size} bytes but only {available} remain"
    )]
    Overflow {
        offset: usize,
        chunk_type: u16,
        size: u32,
        available: usize,
    },

    #[error("chunk {chunk_type:#06x} at offset {offset:#x} has header size {header_size} for chunk size {size}")]
    BadHeaderSize {
        offset: usize,
        chunk_type: u16,
        header_size: u16,
        size: u32,
    },

    #[error("unexpected end of chunk {chunk_type:#06x} at offset {offset:#x}")]
    Truncated { offset: usize, chunk_type: u16 },

    #[error("expected chunk {expected:#06x} at offset {offset:#x}, found {found:#06x}")]
    UnexpectedType {
        offset: usize,
        expected: u16,
        found: u16,
    },

    #[error("chunk {chunk_type:#06x} at offset {offset:#x}: {reason}")]
    Invalid {
        offset: usize,
        chunk_type: u16,
        reason: String,
    },
}

impl ChunkError {
    pub(crate) fn invalid(offset: usize, chunk_type: u16, reason: impl Into<String>) -> Self {
        Self::Invalid {
            offset,
            chunk_type,
            reason: reason.into(),
        }
    }
}

/// Malformed or truncated binary XML.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed binary XML: {0}")]
pub struct AxmlFormatError(#[from] pub ChunkError);

/// Malformed resource table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed resource table: {0}")]
pub struct ArscFormatError(#[from] pub ChunkError);

/// A resource id could not be turned into a string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("no package with id {package_id:#04x} for resource {id}")]
    Package { id: ResourceId, package_id: u8 },

    #[error("no type {type_id:#04x} for resource {id}")]
    Type { id: ResourceId, type_id: u8 },

    #[error("no entry for resource {id}")]
    Entry { id: ResourceId },

    #[error("resource {id} is a complex value")]
    Complex { id: ResourceId },

    #[error("resource {id} is not a string (type {data_type:#04x})")]
    NotAString { id: ResourceId, data_type: u8 },

    #[error("resource {id} points at string {index} outside the pool")]
    StringIndex { id: ResourceId, index: u32 },

    #[error("reference chain starting at {id} is too deep")]
    TooDeep { id: ResourceId },
}

/// Where in the pipeline a fatal error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpenArchive,
    ReadManifest,
    DecodeManifest,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Stage::OpenArchive => "opening archive",
            Stage::ReadManifest => "reading manifest",
            Stage::DecodeManifest => "decoding manifest",
        };
        f.write_str(text)
    }
}

/// Underlying cause of an [`ExtractionError`].
#[derive(Error, Debug)]
pub enum ExtractionCause {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    InvalidApk(#[from] InvalidApkError),

    #[error(transparent)]
    Manifest(#[from] AxmlFormatError),
}

/// A fatal extraction failure.
#[derive(Error, Debug)]
#[error("{stage} failed: {cause}")]
pub struct ExtractionError {
    pub stage: Stage,
    #[source]
    pub cause: ExtractionCause,
}

impl ExtractionError {
    pub(crate) fn new(stage: Stage, cause: impl Into<ExtractionCause>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}
