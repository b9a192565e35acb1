//! Android binary XML (AXML), the compiled form of `AndroidManifest.xml`.
//!
//! ## Architecture
//!
//! - [`structures`]: Node and attribute types of the flat chunk stream
//! - [`parser`]: Chunk walking and node decoding
//! - [`document`]: [`AxmlDocument`] and the element/attribute lookups extraction needs

mod document;
mod parser;
mod structures;

pub use document::AxmlDocument;
pub use structures::*;
