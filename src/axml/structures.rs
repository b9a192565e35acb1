use crate::res::{ResValue, ResourceId};

/// Namespace URI of the framework's `android:` attributes.
pub const ANDROID_NAMESPACE: &str = "http://schemas.android.com/apk/res/android";

/// Identifies a manifest attribute the way aapt does: by framework resource id
/// when it has one, by namespace and name otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrName {
    /// Namespace URI, `None` for unqualified attributes
    pub namespace: Option<&'static str>,
    pub name: &'static str,
    pub resource_id: Option<ResourceId>,
}

impl AttrName {
    pub const PACKAGE: AttrName = AttrName {
        namespace: None,
        name: "package",
        resource_id: None,
    };
    pub const LABEL: AttrName = AttrName {
        namespace: Some(ANDROID_NAMESPACE),
        name: "label",
        resource_id: Some(ResourceId(0x0101_0001)),
    };
    pub const VERSION_CODE: AttrName = AttrName {
        namespace: Some(ANDROID_NAMESPACE),
        name: "versionCode",
        resource_id: Some(ResourceId(0x0101_021b)),
    };
    pub const VERSION_NAME: AttrName = AttrName {
        namespace: Some(ANDROID_NAMESPACE),
        name: "versionName",
        resource_id: Some(ResourceId(0x0101_021c)),
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: Option<u32>,
    pub name: u32,
    /// Framework resource id from the resource map, if the name has one
    pub resource_id: Option<ResourceId>,
    pub raw_value: Option<u32>,
    pub value: ResValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub line: u32,
    pub namespace: Option<u32>,
    pub name: u32,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTag {
    pub line: u32,
    pub namespace: Option<u32>,
    pub name: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub line: u32,
    pub prefix: Option<u32>,
    pub uri: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CData {
    pub line: u32,
    pub data: Option<u32>,
    pub value: ResValue,
}

/// One node of the flat chunk stream, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlChunk {
    StartNamespace(Namespace),
    EndNamespace(Namespace),
    StartTag(StartTag),
    EndTag(EndTag),
    CData(CData),
}
