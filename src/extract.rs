//! Pulling the identity fields of an APK out of its manifest.

use std::cell::OnceCell;
use std::path::Path;

use crate::arsc::ArscTable;
use crate::axml::{AttrName, AxmlDocument, StartTag};
use crate::error::{ArchiveError, ExtractionError, InvalidApkError, Stage};
use crate::io::{LocalFileReader, ReadAt};
use crate::res::{ResValue, ResourceId};
use crate::zip::{ArchiveReader, DEFAULT_MAX_ENTRY_SIZE};

pub const MANIFEST_ENTRY: &str = "AndroidManifest.xml";
pub const RESOURCES_ENTRY: &str = "resources.arsc";

/// Identity metadata of an application package.
///
/// Every field is always populated: a missing version code reads `"0"`, and
/// an application name that cannot be determined falls back to the package
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApkInfo {
    pub package_name: String,
    pub app_name: String,
    pub version_name: String,
    pub version_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Largest decompressed entry that will be read, in bytes
    pub max_entry_size: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InfoExtractor {
    options: ExtractOptions,
}

impl InfoExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract from an APK on the local filesystem.
    pub fn extract(&self, path: impl AsRef<Path>) -> Result<ApkInfo, ExtractionError> {
        let path = path.as_ref();
        log::debug!("opening {}", path.display());
        let reader = LocalFileReader::new(path)
            .map_err(|e| ExtractionError::new(Stage::OpenArchive, ArchiveError::from(e)))?;
        self.extract_from(reader)
    }

    /// Extract from any random-access source holding an APK.
    pub fn extract_from<R: ReadAt>(&self, reader: R) -> Result<ApkInfo, ExtractionError> {
        let archive = ArchiveReader::with_limit(reader, self.options.max_entry_size)
            .map_err(|e| ExtractionError::new(Stage::OpenArchive, e))?;

        let manifest = match archive.read_entry(MANIFEST_ENTRY) {
            Ok(data) => data,
            Err(ArchiveError::EntryNotFound(_)) => {
                return Err(ExtractionError::new(
                    Stage::ReadManifest,
                    InvalidApkError {
                        entry: MANIFEST_ENTRY.to_string(),
                    },
                ));
            }
            Err(e) => return Err(ExtractionError::new(Stage::ReadManifest, e)),
        };

        let doc = AxmlDocument::parse(&manifest)
            .map_err(|e| ExtractionError::new(Stage::DecodeManifest, e))?;
        let resources = Resources::new(&archive);

        let root = doc.root();
        let package_name = root
            .and_then(|tag| doc.attribute_string(tag, AttrName::PACKAGE))
            .unwrap_or_default()
            .to_string();
        let version_name = root
            .map(|tag| version_name(&doc, tag, &resources))
            .unwrap_or_default();
        let version_code = root
            .map(|tag| version_code(&doc, tag))
            .unwrap_or_else(|| "0".to_string());
        let app_name = app_name(&doc, &resources).unwrap_or_else(|| package_name.clone());

        Ok(ApkInfo {
            package_name,
            app_name,
            version_name,
            version_code,
        })
    }
}

/// Extract with default options.
pub fn extract(path: impl AsRef<Path>) -> Result<ApkInfo, ExtractionError> {
    InfoExtractor::default().extract(path)
}

/// `resources.arsc`, read and decoded the first time it is needed.
struct Resources<'a, R: ReadAt> {
    archive: &'a ArchiveReader<R>,
    table: OnceCell<Option<ArscTable>>,
}

impl<'a, R: ReadAt> Resources<'a, R> {
    fn new(archive: &'a ArchiveReader<R>) -> Self {
        Self {
            archive,
            table: OnceCell::new(),
        }
    }

    fn table(&self) -> Option<&ArscTable> {
        self.table.get_or_init(|| self.load()).as_ref()
    }

    fn load(&self) -> Option<ArscTable> {
        let data = match self.archive.read_entry(RESOURCES_ENTRY) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("cannot read {}: {}", RESOURCES_ENTRY, e);
                return None;
            }
        };
        match ArscTable::parse(&data) {
            Ok(table) => Some(table),
            Err(e) => {
                log::warn!("cannot decode {}: {}", RESOURCES_ENTRY, e);
                None
            }
        }
    }

    fn resolve(&self, id: ResourceId) -> Option<String> {
        let table = self.table()?;
        match table.resolve(id) {
            Ok(value) => Some(value.to_string()),
            Err(e) => {
                log::warn!("cannot resolve {}: {}", id, e);
                None
            }
        }
    }
}

fn version_name<R: ReadAt>(doc: &AxmlDocument, root: &StartTag, resources: &Resources<'_, R>) -> String {
    let Some(attr) = doc.attribute(root, AttrName::VERSION_NAME) else {
        return String::new();
    };
    if let Some(text) = doc.literal(attr) {
        return text.to_string();
    }
    match attr.value {
        ResValue::Reference(id) => resources.resolve(id).unwrap_or_default(),
        _ => String::new(),
    }
}

/// Decimal version code, `"0"` when absent or not an integer.
fn version_code(doc: &AxmlDocument, root: &StartTag) -> String {
    let Some(attr) = doc.attribute(root, AttrName::VERSION_CODE) else {
        return "0".to_string();
    };
    if let ResValue::Integer(code) = attr.value {
        return code.to_string();
    }
    match doc.literal(attr).map(|text| text.trim().parse::<i64>()) {
        Some(Ok(code)) => code.to_string(),
        _ => {
            log::warn!("version code {:?} is not an integer", attr.value);
            "0".to_string()
        }
    }
}

/// The application label, or `None` when the package name should stand in.
fn app_name<R: ReadAt>(doc: &AxmlDocument, resources: &Resources<'_, R>) -> Option<String> {
    let Some(label) = doc
        .application()
        .and_then(|app| doc.attribute(app, AttrName::LABEL))
    else {
        log::info!("manifest has no application label");
        return None;
    };

    let name = match (doc.literal(label), label.value) {
        (Some(text), _) => text.to_string(),
        (None, ResValue::Reference(id)) => resources.resolve(id)?,
        (None, other) => {
            log::warn!("application label has unexpected type {:#04x}", other.data_type());
            return None;
        }
    };

    if name.is_empty() {
        log::warn!("application label is empty");
        return None;
    }
    Some(name)
}
