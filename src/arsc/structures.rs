use std::collections::BTreeMap;
use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::res::{ResValue, ResourceId, StringPool};

pub const DENSITY_DEFAULT: u16 = 0;
pub const DENSITY_LOW: u16 = 120;
pub const DENSITY_MEDIUM: u16 = 160;
pub const DENSITY_TV: u16 = 213;
pub const DENSITY_HIGH: u16 = 240;
pub const DENSITY_XHIGH: u16 = 320;
pub const DENSITY_XXHIGH: u16 = 480;
pub const DENSITY_XXXHIGH: u16 = 640;
pub const DENSITY_ANY: u16 = 0xFFFE;
pub const DENSITY_NONE: u16 = 0xFFFF;

/// `ResTable_config`: the qualifiers a type chunk's values apply to.
///
/// Older tables write a shorter struct; missing trailing fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResConfig {
    pub size: u32,
    pub mcc: u16,
    pub mnc: u16,
    pub language: [u8; 2],
    pub country: [u8; 2],
    pub orientation: u8,
    pub touchscreen: u8,
    pub density: u16,
    pub keyboard: u8,
    pub navigation: u8,
    pub input_flags: u8,
    pub screen_width: u16,
    pub screen_height: u16,
    pub sdk_version: u16,
    pub minor_version: u16,
    pub screen_layout: u8,
    pub ui_mode: u8,
    pub smallest_screen_width_dp: u16,
    pub screen_width_dp: u16,
    pub screen_height_dp: u16,
    pub locale_script: [u8; 4],
    pub locale_variant: [u8; 8],
    pub screen_layout2: u8,
    pub color_mode: u8,
    pub locale_script_was_computed: bool,
    pub locale_numbering_system: [u8; 8],
}

impl ResConfig {
    pub const MAX_SIZE: usize = 64;

    /// Decode from the bytes of the struct as stored, `size` field included.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut raw = [0u8; Self::MAX_SIZE];
        let len = bytes.len().min(Self::MAX_SIZE);
        raw[..len].copy_from_slice(&bytes[..len]);

        let u16_at = |at: usize| LittleEndian::read_u16(&raw[at..at + 2]);
        let mut locale_script = [0u8; 4];
        locale_script.copy_from_slice(&raw[36..40]);
        let mut locale_variant = [0u8; 8];
        locale_variant.copy_from_slice(&raw[40..48]);
        let mut locale_numbering_system = [0u8; 8];
        locale_numbering_system.copy_from_slice(&raw[53..61]);

        Self {
            size: LittleEndian::read_u32(&raw[0..4]),
            mcc: u16_at(4),
            mnc: u16_at(6),
            language: [raw[8], raw[9]],
            country: [raw[10], raw[11]],
            orientation: raw[12],
            touchscreen: raw[13],
            density: u16_at(14),
            keyboard: raw[16],
            navigation: raw[17],
            input_flags: raw[18],
            screen_width: u16_at(20),
            screen_height: u16_at(22),
            sdk_version: u16_at(24),
            minor_version: u16_at(26),
            screen_layout: raw[28],
            ui_mode: raw[29],
            smallest_screen_width_dp: u16_at(30),
            screen_width_dp: u16_at(32),
            screen_height_dp: u16_at(34),
            locale_script,
            locale_variant,
            screen_layout2: raw[48],
            color_mode: raw[49],
            locale_script_was_computed: raw[52] != 0,
            locale_numbering_system,
        }
    }

    /// No qualifier of any kind is set.
    pub fn is_default(&self) -> bool {
        *self
            == Self {
                size: self.size,
                ..Self::default()
            }
    }

    pub fn has_locale(&self) -> bool {
        self.language != [0; 2]
            || self.country != [0; 2]
            || self.locale_script != [0; 4]
            || self.locale_variant != [0; 8]
            || self.locale_numbering_system != [0; 8]
    }

    pub fn has_density(&self) -> bool {
        self.density != DENSITY_DEFAULT
    }
}

/// Renders the common qualifiers in resource directory style, e.g. `en-rUS-hdpi-v21`.
impl fmt::Display for ResConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.mcc != 0 {
            parts.push(format!("mcc{}", self.mcc));
        }
        if self.mnc != 0 {
            parts.push(format!("mnc{}", self.mnc));
        }
        if self.language != [0; 2] {
            parts.push(String::from_utf8_lossy(&self.language).into_owned());
        }
        if self.country != [0; 2] {
            parts.push(format!("r{}", String::from_utf8_lossy(&self.country)));
        }
        if self.smallest_screen_width_dp != 0 {
            parts.push(format!("sw{}dp", self.smallest_screen_width_dp));
        }
        match self.orientation {
            0 => {}
            1 => parts.push("port".into()),
            2 => parts.push("land".into()),
            other => parts.push(format!("orientation{other}")),
        }
        match self.density {
            DENSITY_DEFAULT => {}
            DENSITY_LOW => parts.push("ldpi".into()),
            DENSITY_MEDIUM => parts.push("mdpi".into()),
            DENSITY_TV => parts.push("tvdpi".into()),
            DENSITY_HIGH => parts.push("hdpi".into()),
            DENSITY_XHIGH => parts.push("xhdpi".into()),
            DENSITY_XXHIGH => parts.push("xxhdpi".into()),
            DENSITY_XXXHIGH => parts.push("xxxhdpi".into()),
            DENSITY_ANY => parts.push("anydpi".into()),
            DENSITY_NONE => parts.push("nodpi".into()),
            other => parts.push(format!("{other}dpi")),
        }
        if self.sdk_version != 0 {
            parts.push(format!("v{}", self.sdk_version));
        }

        if parts.is_empty() {
            if self.is_default() {
                f.write_str("default")
            } else {
                f.write_str("other")
            }
        } else {
            f.write_str(&parts.join("-"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Simple { key: u32, value: ResValue },
    /// A bag (style, plural, array); map items are not decoded
    Complex {
        key: u32,
        parent: Option<ResourceId>,
        count: u32,
    },
}

impl Entry {
    /// Index into the package's key pool.
    pub fn key(&self) -> u32 {
        match self {
            Entry::Simple { key, .. } | Entry::Complex { key, .. } => *key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub id: u8,
    pub entry_count: u32,
    pub flags: Vec<u32>,
}

/// One configuration variant of a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeChunk {
    pub id: u8,
    pub flags: u8,
    pub config: ResConfig,
    /// Number of slots the chunk declares (present entries only when sparse)
    pub entry_count: u32,
    pub entries: BTreeMap<u16, Entry>,
}

impl TypeChunk {
    pub const FLAG_SPARSE: u8 = 0x01;
    pub const FLAG_OFFSET16: u8 = 0x02;

    pub fn entry(&self, index: u16) -> Option<&Entry> {
        self.entries.get(&index)
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    pub id: u8,
    pub name: String,
    pub type_strings: StringPool,
    pub key_strings: StringPool,
    pub specs: Vec<TypeSpec>,
    pub types: Vec<TypeChunk>,
}

impl Package {
    /// Pick the configuration variant of `type_id` that stands in for the
    /// default resources.
    ///
    /// A chunk with no qualifiers at all wins, then one without locale or
    /// density qualifiers, then the first chunk declared for the type.
    pub fn select_type(&self, type_id: u8) -> Option<&TypeChunk> {
        let candidates = || self.types.iter().filter(move |t| t.id == type_id);
        candidates()
            .find(|t| t.config.is_default())
            .or_else(|| candidates().find(|t| !t.config.has_locale() && !t.config.has_density()))
            .or_else(|| candidates().next())
    }

    /// Name of a type, e.g. `string`.
    pub fn type_name(&self, type_id: u8) -> Option<&str> {
        let index = (type_id as u32).checked_sub(1)?;
        self.type_strings.get(index)
    }

    pub fn key_name(&self, entry: &Entry) -> Option<&str> {
        self.key_strings.get(entry.key())
    }
}
