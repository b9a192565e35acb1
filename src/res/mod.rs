//! Building blocks shared by the binary XML and resource table decoders.
//!
//! Both formats are a tree of self-sizing chunks. Every decoder here works on
//! a slice cut to the chunk's declared bound and never reads past it.

pub mod chunk;
mod string_pool;
mod value;

pub use chunk::{ChunkHeader, ChunkIter, ChunkReader, NO_INDEX, optional_index};
pub use string_pool::StringPool;
pub use value::*;
