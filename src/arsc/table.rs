use crate::error::{ArscFormatError, NotFoundError};
use crate::res::{ResValue, ResourceId, StringPool};

use super::parser;
use super::structures::*;

/// How many references [`ArscTable::resolve`] follows before giving up.
pub const MAX_REFERENCE_DEPTH: usize = 8;

/// A decoded `resources.arsc`.
#[derive(Debug, Clone)]
pub struct ArscTable {
    /// Global pool that string values index into
    pub strings: StringPool,
    pub packages: Vec<Package>,
}

impl ArscTable {
    pub fn parse(data: &[u8]) -> Result<Self, ArscFormatError> {
        parser::parse(data)
    }

    pub fn package(&self, id: u8) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Resolve `id` to a string under the default-like configuration.
    ///
    /// A value that is itself a reference is followed, at most
    /// [`MAX_REFERENCE_DEPTH`] times.
    pub fn resolve(&self, id: ResourceId) -> Result<&str, NotFoundError> {
        let mut current = id;
        for _ in 0..=MAX_REFERENCE_DEPTH {
            match self.lookup(current)? {
                ResValue::String(index) => {
                    return self
                        .strings
                        .get(index)
                        .ok_or(NotFoundError::StringIndex { id: current, index });
                }
                ResValue::Reference(next) => {
                    log::debug!("resource {} refers to {}", current, next);
                    current = next;
                }
                other => {
                    return Err(NotFoundError::NotAString {
                        id: current,
                        data_type: other.data_type(),
                    });
                }
            }
        }
        Err(NotFoundError::TooDeep { id })
    }

    /// The simple value stored for `id` in the selected configuration.
    fn lookup(&self, id: ResourceId) -> Result<ResValue, NotFoundError> {
        let package = self.package(id.package_id()).ok_or(NotFoundError::Package {
            id,
            package_id: id.package_id(),
        })?;
        let chunk = package.select_type(id.type_id()).ok_or(NotFoundError::Type {
            id,
            type_id: id.type_id(),
        })?;
        log::debug!(
            "resolving {} in {}/{} [{}]",
            id,
            package.name,
            package.type_name(id.type_id()).unwrap_or("?"),
            chunk.config
        );

        match chunk.entry(id.entry_index()) {
            Some(Entry::Simple { value, .. }) => Ok(*value),
            Some(Entry::Complex { .. }) => Err(NotFoundError::Complex { id }),
            None => Err(NotFoundError::Entry { id }),
        }
    }
}
