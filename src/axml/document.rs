use crate::error::AxmlFormatError;
use crate::res::{ResValue, ResourceId, StringPool};

use super::parser;
use super::structures::*;

/// A decoded binary XML document.
#[derive(Debug, Clone)]
pub struct AxmlDocument {
    pub strings: StringPool,
    /// Resource ids for the first `resource_map.len()` string pool entries
    pub resource_map: Vec<ResourceId>,
    pub chunks: Vec<XmlChunk>,
}

impl AxmlDocument {
    pub fn parse(data: &[u8]) -> Result<Self, AxmlFormatError> {
        parser::parse(data)
    }

    pub fn string(&self, index: u32) -> Option<&str> {
        self.strings.get(index)
    }

    /// All start tags in document order, paired with their depth (root is 0).
    pub fn elements(&self) -> impl Iterator<Item = (usize, &StartTag)> + '_ {
        let mut depth = 0usize;
        self.chunks.iter().filter_map(move |chunk| match chunk {
            XmlChunk::StartTag(tag) => {
                depth += 1;
                Some((depth - 1, tag))
            }
            XmlChunk::EndTag(_) => {
                depth = depth.saturating_sub(1);
                None
            }
            _ => None,
        })
    }

    pub fn root(&self) -> Option<&StartTag> {
        self.elements().next().map(|(_, tag)| tag)
    }

    /// The `application` element directly under the root.
    pub fn application(&self) -> Option<&StartTag> {
        self.elements()
            .find(|(depth, tag)| *depth == 1 && self.tag_name(tag) == Some("application"))
            .map(|(_, tag)| tag)
    }

    pub fn tag_name(&self, tag: &StartTag) -> Option<&str> {
        self.string(tag.name)
    }

    /// Find an attribute on `tag`.
    ///
    /// A resource id match wins, which keeps lookups working when the name
    /// strings have been obfuscated. Attributes without a resource id are
    /// matched by namespace URI and name.
    pub fn attribute<'a>(&self, tag: &'a StartTag, name: AttrName) -> Option<&'a Attribute> {
        if let Some(wanted) = name.resource_id
            && let Some(attr) = tag
                .attributes
                .iter()
                .find(|a| a.resource_id == Some(wanted))
        {
            return Some(attr);
        }
        tag.attributes.iter().find(|a| {
            a.resource_id.is_none()
                && self.string(a.name) == Some(name.name)
                && a.namespace.and_then(|ns| self.string(ns)) == name.namespace
        })
    }

    /// The literal string value of an attribute, if it has one.
    ///
    /// Uses the raw value when present, then a typed string value.
    pub fn attribute_string(&self, tag: &StartTag, name: AttrName) -> Option<&str> {
        let attr = self.attribute(tag, name)?;
        self.literal(attr)
    }

    pub fn literal(&self, attr: &Attribute) -> Option<&str> {
        if let Some(raw) = attr.raw_value.and_then(|idx| self.string(idx)) {
            return Some(raw);
        }
        match attr.value {
            ResValue::String(idx) => self.string(idx),
            _ => None,
        }
    }

    /// Text of every CDATA node, in order.
    pub fn text(&self) -> impl Iterator<Item = &str> + '_ {
        self.chunks.iter().filter_map(|chunk| match chunk {
            XmlChunk::CData(cdata) => cdata.data.and_then(|idx| self.string(idx)),
            _ => None,
        })
    }
}
