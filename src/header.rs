use crate::cursor::Cursor;
use crate::error::{Error, Result};

/// The signature every supported table starts with.
pub const SIGNATURE: [u8; 4] = *b"WDC3";

/// Size of the encoded header, in bytes.
pub const HEADER_SIZE: usize = 72;

/// Records are variable-length and located through per-section offset maps. Strings are inlined
/// in the record bytes instead of living in a string table.
pub const FLAG_OFFSET_MAP: u16 = 0x01;
/// The table has a secondary key. Informational only.
pub const FLAG_SECONDARY_KEY: u16 = 0x02;
/// Row IDs come from a per-section index table instead of a column.
pub const FLAG_INDEX_TABLE: u16 = 0x04;

/// The fixed-size file header.
///
/// Field order on disk is exactly the declaration order here; nothing in the header is
/// self-describing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub signature: [u8; 4],
    pub record_count: u32,
    pub field_count: u32,
    pub record_size: u32,
    pub string_table_size: u32,
    pub table_hash: u32,
    pub layout_hash: u32,
    pub min_id: u32,
    pub max_id: u32,
    pub locale: u32,
    pub flags: u16,
    pub id_index: u16,
    pub total_field_count: u32,
    pub bitpacked_data_offset: u32,
    pub lookup_column_count: u32,
    pub column_meta_size: u32,
    pub common_data_size: u32,
    pub pallet_data_size: u32,
    pub section_count: u32,
}

impl Header {
    pub(crate) fn parse(cursor: &mut Cursor) -> Result<Header> {
        let signature = cursor.array4("read signature")?;
        if signature != SIGNATURE {
            return Err(Error::FormatMismatch {
                expected: SIGNATURE,
                actual: signature,
            });
        }
        let step = "read header";
        Ok(Header {
            signature,
            record_count: cursor.u32(step)?,
            field_count: cursor.u32(step)?,
            record_size: cursor.u32(step)?,
            string_table_size: cursor.u32(step)?,
            table_hash: cursor.u32(step)?,
            layout_hash: cursor.u32(step)?,
            min_id: cursor.u32(step)?,
            max_id: cursor.u32(step)?,
            locale: cursor.u32(step)?,
            flags: cursor.u16(step)?,
            id_index: cursor.u16(step)?,
            total_field_count: cursor.u32(step)?,
            bitpacked_data_offset: cursor.u32(step)?,
            lookup_column_count: cursor.u32(step)?,
            column_meta_size: cursor.u32(step)?,
            common_data_size: cursor.u32(step)?,
            pallet_data_size: cursor.u32(step)?,
            section_count: cursor.u32(step)?,
        })
    }

    /// Whether records are addressed through offset maps (sparse mode).
    pub fn has_offset_map(&self) -> bool {
        self.flags & FLAG_OFFSET_MAP != 0
    }

    pub fn has_index_table(&self) -> bool {
        self.flags & FLAG_INDEX_TABLE != 0
    }

    pub fn has_secondary_key(&self) -> bool {
        self.flags & FLAG_SECONDARY_KEY != 0
    }
}
