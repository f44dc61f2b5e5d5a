use crate::cursor::Cursor;
use crate::error::Result;

/// Size of one encoded section descriptor, in bytes.
pub const SECTION_HEADER_SIZE: usize = 40;

/// Location and size of one section's data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeader {
    /// Lookup of the key the section is encrypted with. Zero means unencrypted.
    pub tact_key_lookup: u64,
    pub file_offset: u32,
    pub record_count: u32,
    pub string_table_size: u32,
    /// Where the sparse table begins. Only meaningful with an offset map.
    pub offset_records_end: u32,
    /// Size of the index data, in bytes.
    pub id_list_size: u32,
    /// Size of the reference-data block, in bytes.
    pub relationship_data_size: u32,
    pub offset_map_id_count: u32,
    pub copy_table_count: u32,
}

impl SectionHeader {
    pub(crate) fn parse(cursor: &mut Cursor) -> Result<SectionHeader> {
        let step = "read section header";
        Ok(SectionHeader {
            tact_key_lookup: cursor.u64(step)?,
            file_offset: cursor.u32(step)?,
            record_count: cursor.u32(step)?,
            string_table_size: cursor.u32(step)?,
            offset_records_end: cursor.u32(step)?,
            id_list_size: cursor.u32(step)?,
            relationship_data_size: cursor.u32(step)?,
            offset_map_id_count: cursor.u32(step)?,
            copy_table_count: cursor.u32(step)?,
        })
    }

    pub(crate) fn parse_all(cursor: &mut Cursor, count: u32) -> Result<Vec<SectionHeader>> {
        cursor.ensure(count as usize, SECTION_HEADER_SIZE, "read section headers")?;
        (0..count).map(|_| Self::parse(cursor)).collect()
    }

    pub fn is_encrypted(&self) -> bool {
        self.tact_key_lookup != 0
    }
}
