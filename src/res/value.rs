use std::fmt;

use crate::error::ChunkError;

use super::chunk::ChunkReader;

pub const TYPE_NULL: u8 = 0x00;
pub const TYPE_REFERENCE: u8 = 0x01;
pub const TYPE_ATTRIBUTE: u8 = 0x02;
pub const TYPE_STRING: u8 = 0x03;
pub const TYPE_FLOAT: u8 = 0x04;
pub const TYPE_DYNAMIC_REFERENCE: u8 = 0x07;
pub const TYPE_INT_DEC: u8 = 0x10;
pub const TYPE_INT_HEX: u8 = 0x11;
pub const TYPE_INT_BOOLEAN: u8 = 0x12;

/// A packed `0xPPTTEEEE` resource identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub u32);

impl ResourceId {
    pub fn package_id(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn type_id(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn entry_index(self) -> u16 {
        self.0 as u16
    }
}

impl From<u32> for ResourceId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// The subset of `Res_value` that extraction cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResValue {
    /// Index into the owning document's global string pool
    String(u32),
    Integer(i32),
    Boolean(bool),
    Reference(ResourceId),
    Other { data_type: u8, data: u32 },
}

impl ResValue {
    pub const SIZE: usize = 8;

    pub fn decode(data_type: u8, data: u32) -> Self {
        match data_type {
            TYPE_STRING => ResValue::String(data),
            TYPE_INT_DEC | TYPE_INT_HEX => ResValue::Integer(data as i32),
            TYPE_INT_BOOLEAN => ResValue::Boolean(data != 0),
            // A zero reference is "@null"
            TYPE_REFERENCE | TYPE_DYNAMIC_REFERENCE if data != 0 => {
                ResValue::Reference(ResourceId(data))
            }
            _ => ResValue::Other { data_type, data },
        }
    }

    /// Read a `Res_value` {size, res0, dataType, data} at the reader's position.
    pub fn read(reader: &mut ChunkReader<'_>) -> Result<Self, ChunkError> {
        let size = reader.read_u16()?;
        if (size as usize) < Self::SIZE {
            return Err(reader.invalid(format!("typed value declares size {size}")));
        }
        let _res0 = reader.read_u8()?;
        let data_type = reader.read_u8()?;
        let data = reader.read_u32()?;
        Ok(Self::decode(data_type, data))
    }

    pub fn data_type(&self) -> u8 {
        match self {
            ResValue::String(_) => TYPE_STRING,
            ResValue::Integer(_) => TYPE_INT_DEC,
            ResValue::Boolean(_) => TYPE_INT_BOOLEAN,
            ResValue::Reference(_) => TYPE_REFERENCE,
            ResValue::Other { data_type, .. } => *data_type,
        }
    }
}
