//! The compiled resource table, `resources.arsc`.
//!
//! Only what is needed to turn a resource id into a string is decoded:
//! packages, their type chunks and the simple values inside them. Bag
//! contents of complex entries are left alone.
//!
//! ## Architecture
//!
//! - [`structures`]: Packages, type chunks, entries and [`ResConfig`]
//! - [`parser`]: Chunk walking for the table, package and type chunks
//! - [`table`]: [`ArscTable`] and id resolution

mod parser;
mod structures;
mod table;

pub use structures::*;
pub use table::{ArscTable, MAX_REFERENCE_DEPTH};
