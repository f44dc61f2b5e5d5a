//! Column-wide data shared by every row: pallet blocks and common-value dictionaries.

use std::collections::HashMap;

use crate::column::ColumnMeta;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::value::Value32;

/// Pallet values per column. Columns without pallet compression have an empty block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PalletData {
    blocks: Vec<Vec<Value32>>,
}

impl PalletData {
    /// Read one block for each pallet column, in column order, with no padding between them.
    pub(crate) fn parse(cursor: &mut Cursor, columns: &[ColumnMeta]) -> Result<PalletData> {
        let blocks = columns
            .iter()
            .map(|col| {
                if !col.compression.uses_pallet() {
                    return Ok(Vec::new());
                }
                let count = col.additional_data_size as usize / 4;
                let raw = cursor.bytes(count * 4, "read pallet data")?;
                Ok(raw
                    .chunks_exact(4)
                    .map(|c| Value32::from_bytes([c[0], c[1], c[2], c[3]]))
                    .collect())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PalletData { blocks })
    }

    /// The pallet block for a column.
    pub fn block(&self, column: usize) -> &[Value32] {
        self.blocks.get(column).map(|b| b.as_slice()).unwrap_or(&[])
    }

    /// Look up `count` consecutive values starting at `index * count`.
    pub(crate) fn lookup(&self, column: usize, index: u32, count: u32) -> Result<&[Value32]> {
        let block = self.block(column);
        let start = index as usize * count as usize;
        let end = start + count as usize;
        block.get(start..end).ok_or_else(|| {
            Error::StructuralInconsistency(format!(
                "Pallet index {} (x{}) is past the end of column {}'s {} pallet values",
                index,
                count,
                column,
                block.len()
            ))
        })
    }
}

/// Common-value dictionaries per column, keyed by row ID.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommonData {
    maps: Vec<HashMap<u32, Value32>>,
}

impl CommonData {
    /// Read one dictionary for each common column, in column order.
    pub(crate) fn parse(cursor: &mut Cursor, columns: &[ColumnMeta]) -> Result<CommonData> {
        let maps = columns
            .iter()
            .map(|col| {
                if !col.compression.uses_common() {
                    return Ok(HashMap::new());
                }
                let count = col.additional_data_size as usize / 8;
                cursor.ensure(count, 8, "read common data")?;
                let mut map = HashMap::with_capacity(count);
                for _ in 0..count {
                    let id = cursor.u32("read common data")?;
                    let value = cursor.array4("read common data")?;
                    map.insert(id, Value32::from_bytes(value));
                }
                Ok(map)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CommonData { maps })
    }

    /// Look up a row's value in a column's dictionary, if it has an entry.
    pub fn get(&self, column: usize, id: u32) -> Option<Value32> {
        self.maps.get(column).and_then(|m| m.get(&id).copied())
    }

    pub fn len(&self, column: usize) -> usize {
        self.maps.get(column).map_or(0, |m| m.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::column::Compression;

    fn col(compression: Compression, extra: u32) -> ColumnMeta {
        ColumnMeta {
            field_offset_bits: 0,
            field_size_bits: 0,
            additional_data_size: extra,
            compression,
        }
    }

    #[test]
    fn pallet_blocks_follow_column_order() {
        let columns = [
            col(
                Compression::Pallet {
                    bit_offset: 0,
                    bit_width: 2,
                },
                8,
            ),
            col(Compression::None, 0),
            col(
                Compression::PalletArray {
                    bit_offset: 2,
                    bit_width: 1,
                    cardinality: 2,
                },
                16,
            ),
        ];
        let mut buf = Vec::new();
        for v in [10u32, 11, 20, 21, 22, 23, 99] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = Cursor::new(&buf);
        let pallet = PalletData::parse(&mut cursor, &columns).unwrap();
        assert_eq!(cursor.remaining(), 4);
        assert_eq!(pallet.block(0), &[Value32::from(10u32), Value32::from(11u32)]);
        assert!(pallet.block(1).is_empty());
        assert_eq!(
            pallet.lookup(2, 1, 2).unwrap(),
            &[Value32::from(22u32), Value32::from(23u32)]
        );
        assert!(pallet.lookup(2, 2, 2).is_err());
        assert!(pallet.lookup(0, 5, 1).is_err());
    }

    #[test]
    fn common_dictionaries() {
        let columns = [
            col(Compression::None, 0),
            col(
                Compression::Common {
                    default: Value32::from(5u32),
                },
                16,
            ),
        ];
        let mut buf = Vec::new();
        for v in [7u32, 70, 9, 90] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = Cursor::new(&buf);
        let common = CommonData::parse(&mut cursor, &columns).unwrap();
        assert_eq!(common.len(1), 2);
        assert_eq!(common.get(1, 7), Some(Value32::from(70u32)));
        assert_eq!(common.get(1, 8), None);
        assert_eq!(common.get(0, 7), None);
    }

    #[test]
    fn truncated_blocks() {
        let columns = [col(
            Compression::Common {
                default: Value32::ZERO,
            },
            16,
        )];
        let buf = [0u8; 12];
        assert!(CommonData::parse(&mut Cursor::new(&buf), &columns).is_err());
    }
}
