use std::collections::HashMap;

use super::{begin_chunk, finish_chunk, pool_chunk, write_u8, write_u16, write_u32};

/// Configuration qualifiers a test type chunk is tagged with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestConfig {
    pub language: Option<[u8; 2]>,
    pub country: Option<[u8; 2]>,
    pub density: u16,
    pub orientation: u8,
    pub sdk_version: u16,
    /// Bytes actually written for the config; 0 means the full 64
    pub size: u32,
}

impl TestConfig {
    pub fn locale(language: &str, country: Option<&str>) -> Self {
        Self {
            language: Some(two_chars(language)),
            country: country.map(two_chars),
            ..Self::default()
        }
    }

    pub fn density(density: u16) -> Self {
        Self {
            density,
            ..Self::default()
        }
    }

    pub fn sdk(sdk_version: u16) -> Self {
        Self {
            sdk_version,
            ..Self::default()
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        let size = if self.size == 0 { 64 } else { self.size };
        let mut raw = [0u8; 64];
        raw[0..4].copy_from_slice(&size.to_le_bytes());
        if let Some(lang) = self.language {
            raw[8..10].copy_from_slice(&lang);
        }
        if let Some(country) = self.country {
            raw[10..12].copy_from_slice(&country);
        }
        raw[12] = self.orientation;
        raw[14..16].copy_from_slice(&self.density.to_le_bytes());
        raw[24..26].copy_from_slice(&self.sdk_version.to_le_bytes());
        buf.extend_from_slice(&raw[..size as usize]);
    }
}

fn two_chars(code: &str) -> [u8; 2] {
    let bytes = code.as_bytes();
    [bytes[0], bytes[1]]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    String(String),
    Int(i32),
    Reference(u32),
    /// A style/bag entry with no map items
    Complex,
    /// A string in the compact 8-byte entry encoding
    CompactString(String),
}

impl From<&str> for EntryValue {
    fn from(value: &str) -> Self {
        EntryValue::String(value.to_string())
    }
}

/// How the entry offsets of a type chunk are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryLayout {
    #[default]
    Dense,
    Offset16,
    Sparse,
}

#[derive(Debug, Clone)]
pub struct TypeBuilder {
    id: u8,
    config: TestConfig,
    layout: EntryLayout,
    entries: Vec<Option<(String, EntryValue)>>,
}

impl TypeBuilder {
    pub fn new(id: u8, config: TestConfig) -> Self {
        Self {
            id,
            config,
            layout: EntryLayout::Dense,
            entries: Vec::new(),
        }
    }

    pub fn layout(mut self, layout: EntryLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Put `value` at `index`, leaving any earlier slots empty.
    pub fn entry(mut self, index: u16, key: &str, value: impl Into<EntryValue>) -> Self {
        let index = index as usize;
        if self.entries.len() <= index {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = Some((key.to_string(), value.into()));
        self
    }

    /// Declare `count` slots even if the tail is empty.
    pub fn slots(mut self, count: u16) -> Self {
        if self.entries.len() < count as usize {
            self.entries.resize(count as usize, None);
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct PackageBuilder {
    id: u8,
    name: String,
    types: Vec<TypeBuilder>,
    extra_chunks: Vec<Vec<u8>>,
}

impl PackageBuilder {
    pub fn new(id: u8, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            types: Vec::new(),
            extra_chunks: Vec::new(),
        }
    }

    pub fn type_chunk(mut self, chunk: TypeBuilder) -> Self {
        self.types.push(chunk);
        self
    }

    /// Extra bytes placed before the type chunks, e.g. a library chunk.
    pub fn raw_chunk(mut self, bytes: Vec<u8>) -> Self {
        self.extra_chunks.push(bytes);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    packages: Vec<PackageBuilder>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(mut self, package: PackageBuilder) -> Self {
        self.packages.push(package);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut globals = Interner::default();
        let packages: Vec<Vec<u8>> = self
            .packages
            .iter()
            .map(|p| write_package(p, &mut globals))
            .collect();

        let mut buf = Vec::new();
        let start = begin_chunk(&mut buf, 0x0002, 12);
        write_u32(&mut buf, self.packages.len() as u32);
        buf.extend(pool_chunk(&globals.strings, true));
        for package in packages {
            buf.extend(package);
        }
        finish_chunk(&mut buf, start);
        buf
    }
}

#[derive(Default)]
struct Interner {
    strings: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl Interner {
    fn intern(&mut self, value: &str) -> u32 {
        if let Some(&idx) = self.lookup.get(value) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(value.to_string());
        self.lookup.insert(value.to_string(), idx);
        idx
    }
}

const PACKAGE_HEADER_SIZE: u16 = 288;
const TYPE_HEADER_SIZE: u16 = 20 + 64;

fn write_package(package: &PackageBuilder, globals: &mut Interner) -> Vec<u8> {
    let max_type = package.types.iter().map(|t| t.id).max().unwrap_or(0);
    let type_names: Vec<String> = (1..=max_type).map(|id| format!("type{id}")).collect();
    let mut keys = Interner::default();

    let mut body = Vec::new();
    for raw in &package.extra_chunks {
        body.extend_from_slice(raw);
    }

    let mut specs_written = Vec::new();
    for chunk in &package.types {
        if !specs_written.contains(&chunk.id) {
            specs_written.push(chunk.id);
            let entry_count = package
                .types
                .iter()
                .filter(|t| t.id == chunk.id)
                .map(|t| t.entries.len())
                .max()
                .unwrap_or(0);
            let start = begin_chunk(&mut body, 0x0202, 16);
            write_u8(&mut body, chunk.id);
            write_u8(&mut body, 0);
            write_u16(&mut body, 0);
            write_u32(&mut body, entry_count as u32);
            for _ in 0..entry_count {
                write_u32(&mut body, 0);
            }
            finish_chunk(&mut body, start);
        }
        body.extend(write_type(chunk, globals, &mut keys));
    }

    let mut buf = Vec::new();
    let start = begin_chunk(&mut buf, 0x0200, PACKAGE_HEADER_SIZE);
    write_u32(&mut buf, package.id as u32);
    let mut name: Vec<u16> = package.name.encode_utf16().take(127).collect();
    name.resize(128, 0);
    for unit in name {
        write_u16(&mut buf, unit);
    }
    let type_pool = pool_chunk(&type_names, false);
    let key_pool = pool_chunk(&keys.strings, true);
    let type_strings = PACKAGE_HEADER_SIZE as u32;
    let key_strings = type_strings + type_pool.len() as u32;
    write_u32(&mut buf, type_strings);
    write_u32(&mut buf, type_names.len() as u32);
    write_u32(&mut buf, key_strings);
    write_u32(&mut buf, keys.strings.len() as u32);
    write_u32(&mut buf, 0); // typeIdOffset
    buf.extend(type_pool);
    buf.extend(key_pool);
    buf.extend(body);
    finish_chunk(&mut buf, start);
    buf
}

fn write_type(chunk: &TypeBuilder, globals: &mut Interner, keys: &mut Interner) -> Vec<u8> {
    let mut entries = Vec::new();
    let mut offsets: Vec<Option<u32>> = Vec::with_capacity(chunk.entries.len());
    for slot in &chunk.entries {
        let Some((key, value)) = slot else {
            offsets.push(None);
            continue;
        };
        offsets.push(Some(entries.len() as u32));
        let key = keys.intern(key);
        match value {
            EntryValue::Complex => {
                write_u16(&mut entries, 16);
                write_u16(&mut entries, 0x0001);
                write_u32(&mut entries, key);
                write_u32(&mut entries, 0); // parent
                write_u32(&mut entries, 0); // count
            }
            EntryValue::CompactString(s) => {
                let idx = globals.intern(s);
                write_u16(&mut entries, key as u16);
                write_u16(&mut entries, 0x0008 | (0x03 << 8));
                write_u32(&mut entries, idx);
            }
            simple => {
                let (data_type, data) = match simple {
                    EntryValue::String(s) => (0x03u8, globals.intern(s)),
                    EntryValue::Int(v) => (0x10, *v as u32),
                    EntryValue::Reference(id) => (0x01, *id),
                    EntryValue::Complex | EntryValue::CompactString(_) => unreachable!(),
                };
                write_u16(&mut entries, 8);
                write_u16(&mut entries, 0);
                write_u32(&mut entries, key);
                write_u16(&mut entries, 8);
                write_u8(&mut entries, 0);
                write_u8(&mut entries, data_type);
                write_u32(&mut entries, data);
            }
        }
    }

    let mut offset_table = Vec::new();
    let (flags, entry_count) = match chunk.layout {
        EntryLayout::Dense => {
            for offset in &offsets {
                write_u32(&mut offset_table, offset.unwrap_or(0xFFFF_FFFF));
            }
            (0u8, offsets.len())
        }
        EntryLayout::Offset16 => {
            for offset in &offsets {
                write_u16(&mut offset_table, offset.map_or(0xFFFF, |o| (o / 4) as u16));
            }
            (0x02, offsets.len())
        }
        EntryLayout::Sparse => {
            let mut present = 0;
            for (idx, offset) in offsets.iter().enumerate() {
                if let Some(offset) = offset {
                    write_u16(&mut offset_table, idx as u16);
                    write_u16(&mut offset_table, (offset / 4) as u16);
                    present += 1;
                }
            }
            (0x01, present)
        }
    };
    while offset_table.len() % 4 != 0 {
        offset_table.push(0);
    }

    let config_size = if chunk.config.size == 0 { 64 } else { chunk.config.size };
    let header_size = TYPE_HEADER_SIZE - 64 + config_size as u16;

    let mut buf = Vec::new();
    let start = begin_chunk(&mut buf, 0x0201, header_size);
    write_u8(&mut buf, chunk.id);
    write_u8(&mut buf, flags);
    write_u16(&mut buf, 0);
    write_u32(&mut buf, entry_count as u32);
    write_u32(&mut buf, header_size as u32 + offset_table.len() as u32);
    chunk.config.write(&mut buf);
    buf.extend(offset_table);
    buf.extend(entries);
    finish_chunk(&mut buf, start);
    buf
}

/// A table with one package `0x7f` mapping `@string/app_name` (`0x7f0a0000`)
/// to `app_name` in the default configuration.
pub fn app_name_table(app_name: &str) -> Vec<u8> {
    TableBuilder::new()
        .package(
            PackageBuilder::new(0x7f, "com.acme.app")
                .type_chunk(TypeBuilder::new(0x0a, TestConfig::default()).entry(0, "app_name", app_name)),
        )
        .build()
}
