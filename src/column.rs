//! Per-field layout and per-column compression descriptors.

use std::convert::TryFrom;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::value::Value32;

pub const FIELD_META_SIZE: usize = 4;
pub const COLUMN_META_SIZE: usize = 24;

/// Signed flag in an immediate column's flags word.
const IMMEDIATE_SIGNED: u32 = 0x01;

/// Per-field layout hint. `size` is stored as 32 minus the field's width in bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMeta {
    pub size: i16,
    pub offset: u16,
}

impl FieldMeta {
    fn parse(cursor: &mut Cursor) -> Result<FieldMeta> {
        let step = "read field metadata";
        Ok(FieldMeta {
            size: cursor.i16(step)?,
            offset: cursor.u16(step)?,
        })
    }

    /// Width in bits of an uncompressed field, if this metadata describes one of at most 32 bits.
    pub fn bit_width(&self) -> Option<u32> {
        let width = 32 - self.size as i32;
        if (1..=32).contains(&width) {
            Some(width as u32)
        } else {
            None
        }
    }
}

/// On-disk compression codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Immediate,
    Common,
    Pallet,
    PalletArray,
    SignedImmediate,
}

impl From<CompressionType> for u32 {
    fn from(val: CompressionType) -> u32 {
        match val {
            CompressionType::None => 0,
            CompressionType::Immediate => 1,
            CompressionType::Common => 2,
            CompressionType::Pallet => 3,
            CompressionType::PalletArray => 4,
            CompressionType::SignedImmediate => 5,
        }
    }
}

impl TryFrom<u32> for CompressionType {
    type Error = u32;
    fn try_from(val: u32) -> Result<CompressionType, u32> {
        match val {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Immediate),
            2 => Ok(CompressionType::Common),
            3 => Ok(CompressionType::Pallet),
            4 => Ok(CompressionType::PalletArray),
            5 => Ok(CompressionType::SignedImmediate),
            _ => Err(val),
        }
    }
}

/// How a column's values are stored, along with the parameters for that storage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Compression {
    /// Stored directly in the record at the column's bit offset.
    None,
    /// Bit-packed directly in the record.
    Immediate {
        bit_offset: u32,
        bit_width: u32,
        signed: bool,
    },
    /// Looked up by row ID, falling back to `default`.
    Common { default: Value32 },
    /// The record holds an index into the column's pallet block.
    Pallet { bit_offset: u32, bit_width: u32 },
    /// The record holds an index to the first of `cardinality` consecutive pallet values.
    PalletArray {
        bit_offset: u32,
        bit_width: u32,
        cardinality: u32,
    },
}

impl Compression {
    pub fn kind(&self) -> CompressionType {
        match self {
            Compression::None => CompressionType::None,
            Compression::Immediate { signed: true, .. } => CompressionType::SignedImmediate,
            Compression::Immediate { .. } => CompressionType::Immediate,
            Compression::Common { .. } => CompressionType::Common,
            Compression::Pallet { .. } => CompressionType::Pallet,
            Compression::PalletArray { .. } => CompressionType::PalletArray,
        }
    }

    pub fn uses_pallet(&self) -> bool {
        matches!(
            self,
            Compression::Pallet { .. } | Compression::PalletArray { .. }
        )
    }

    pub fn uses_common(&self) -> bool {
        matches!(self, Compression::Common { .. })
    }
}

/// Per-column storage descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnMeta {
    /// Bit offset of the column within a fixed-size record.
    pub field_offset_bits: u16,
    /// Bits the column occupies within a fixed-size record.
    pub field_size_bits: u16,
    /// Size in bytes of the column's pallet or common block.
    pub additional_data_size: u32,
    pub compression: Compression,
}

impl ColumnMeta {
    fn parse(cursor: &mut Cursor, column: usize) -> Result<ColumnMeta> {
        let step = "read column metadata";
        let field_offset_bits = cursor.u16(step)?;
        let field_size_bits = cursor.u16(step)?;
        let additional_data_size = cursor.u32(step)?;
        let code = cursor.u32(step)?;
        let a = cursor.u32(step)?;
        let b = cursor.u32(step)?;
        let c = cursor.u32(step)?;
        let kind = CompressionType::try_from(code)
            .map_err(|code| Error::UnknownCompression { column, code })?;
        let compression = match kind {
            CompressionType::None => Compression::None,
            CompressionType::Immediate => Compression::Immediate {
                bit_offset: a,
                bit_width: b,
                signed: c & IMMEDIATE_SIGNED != 0,
            },
            CompressionType::SignedImmediate => Compression::Immediate {
                bit_offset: a,
                bit_width: b,
                signed: true,
            },
            CompressionType::Common => Compression::Common {
                default: Value32::from(a),
            },
            CompressionType::Pallet => Compression::Pallet {
                bit_offset: a,
                bit_width: b,
            },
            CompressionType::PalletArray => Compression::PalletArray {
                bit_offset: a,
                bit_width: b,
                cardinality: c,
            },
        };
        Ok(ColumnMeta {
            field_offset_bits,
            field_size_bits,
            additional_data_size,
            compression,
        })
    }
}

/// Read `field_count` field metadata entries, then `field_count` column metadata entries.
pub(crate) fn parse_columns(
    cursor: &mut Cursor,
    field_count: u32,
) -> Result<(Vec<FieldMeta>, Vec<ColumnMeta>)> {
    let count = field_count as usize;
    cursor.ensure(
        count,
        FIELD_META_SIZE + COLUMN_META_SIZE,
        "read column metadata",
    )?;
    let fields = (0..count)
        .map(|_| FieldMeta::parse(cursor))
        .collect::<Result<Vec<_>>>()?;
    let columns = (0..count)
        .map(|i| ColumnMeta::parse(cursor, i))
        .collect::<Result<Vec<_>>>()?;
    Ok((fields, columns))
}
