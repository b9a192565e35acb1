//! # apkinfo
//!
//! Read the identity of an Android application package (package name,
//! application name, version name and version code) straight from the .apk,
//! without aapt or any other part of the Android build tools.
//!
//! The archive is read with positional I/O: only the central directory,
//! `AndroidManifest.xml` and, when the application label is a resource
//! reference, `resources.arsc` are ever loaded.
//!
//! ## Modules
//!
//! - [`zip`]: ZIP container traversal (ZIP64, stored and deflate entries)
//! - [`res`]: Chunk, string pool and typed value primitives
//! - [`axml`]: Binary XML manifest decoding
//! - [`arsc`]: Resource table decoding and id resolution
//! - [`extract`]: The [`InfoExtractor`] tying them together
//!
//! ## Example
//!
//! ```no_run
//! fn main() -> Result<(), apkinfo::ExtractionError> {
//!     let info = apkinfo::extract("app-release.apk")?;
//!     println!("{} {} ({})", info.app_name, info.version_name, info.version_code);
//!     Ok(())
//! }
//! ```

pub mod arsc;
pub mod axml;
pub mod cli;
pub mod error;
pub mod extract;
pub mod io;
pub mod res;
pub mod zip;

#[cfg(test)]
mod testing;

pub use cli::Cli;
pub use error::{
    ArchiveError, ArscFormatError, AxmlFormatError, ExtractionError, InvalidApkError,
    NotFoundError, Stage,
};
pub use extract::{ApkInfo, ExtractOptions, InfoExtractor, extract};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use zip::{ArchiveReader, ZipFileEntry};
