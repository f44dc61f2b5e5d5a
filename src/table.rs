//! Loading a complete table.
//!
//! File layout, in order:
//!
//! 1. The 72-byte [`Header`].
//! 2. `section_count` [`SectionHeader`]s.
//! 3. `field_count` [`FieldMeta`] entries, then `field_count` [`ColumnMeta`] entries.
//! 4. Pallet blocks, then common blocks, one per column using that compression, in column order.
//! 5. For each section, starting at its `file_offset`: record bytes (and the string table, unless
//!    the table uses offset maps), index data, copy table, sparse entries, reference data, and the
//!    sparse ID list.
//!
//! Decoding runs in two passes. The first walks every section, collecting record bytes, side
//! tables, and strings. Once all the strings are known, the shared column data is frozen and the
//! second pass builds rows from the collected sections.

use std::io::Read;
use std::sync::Arc;

use crate::bits::PaddedBytes;
use crate::column::{self, ColumnMeta, FieldMeta, COLUMN_META_SIZE};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::header::Header;
use crate::layout::TableLayout;
use crate::options::LoadOptions;
use crate::reference::ReferenceData;
use crate::row::Row;
use crate::section::SectionHeader;
use crate::shared::{CommonData, PalletData};
use crate::store::{RecordStore, RecordStoreBuilder};
use crate::strings::StringTable;

/// Placeholder ID (-1) for rows whose ID comes from their ID column.
const NO_ID: u32 = u32::MAX;

/// Size of one encoded sparse entry: a u32 offset and a u16 size.
const SPARSE_ENTRY_SIZE: usize = 6;

/// Location of one variable-length record in a sparse section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparseEntry {
    /// Byte offset of the record from the start of its section.
    pub offset: u32,
    pub size: u16,
}

/// Everything rows need to decode their fields.
#[derive(Debug)]
pub(crate) struct TableShared {
    pub header: Header,
    pub layout: TableLayout,
    pub fields: Vec<FieldMeta>,
    pub columns: Vec<ColumnMeta>,
    pub pallet: PalletData,
    pub common: CommonData,
    pub strings: StringTable,
}

/// One readable section, collected in the first pass.
struct SectionBody {
    index: usize,
    record_count: u32,
    /// Rows in all sections before this one, skipped ones included.
    first_row: u32,
    records: Arc<PaddedBytes>,
    index_data: Vec<u32>,
    sparse_entries: Vec<SparseEntry>,
    references: ReferenceData,
}

impl SectionBody {
    /// Index tables where every entry is zero don't hold real IDs.
    fn index_is_degenerate(&self) -> bool {
        !self.index_data.is_empty() && self.index_data.iter().all(|&id| id == 0)
    }
}

/// A decoded table.
#[derive(Debug)]
pub struct Table {
    shared: Arc<TableShared>,
    sections: Vec<SectionHeader>,
    skipped_sections: usize,
    records: RecordStore,
}

impl Table {
    /// Decode a complete table from its bytes.
    ///
    /// Fails if the signature isn't recognized, the data is truncated, or any structural check
    /// fails. No partial table is ever returned.
    pub fn load(data: &[u8], layout: &TableLayout, options: &LoadOptions) -> Result<Table> {
        match Self::decode(data, layout, options) {
            Ok(table) => {
                tracing::info!(
                    records = table.records.len(),
                    sections = table.sections.len(),
                    skipped_sections = table.skipped_sections,
                    secondary_key = table.header().has_secondary_key(),
                    "table loaded"
                );
                Ok(table)
            }
            Err(err) => {
                tracing::warn!(error = %err, "table load failed");
                Err(err)
            }
        }
    }

    /// Read a stream to its end, then decode it as a table.
    pub fn read_from<R: Read>(
        mut reader: R,
        layout: &TableLayout,
        options: &LoadOptions,
    ) -> Result<Table> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::load(&buf, layout, options)
    }

    fn decode(data: &[u8], layout: &TableLayout, options: &LoadOptions) -> Result<Table> {
        let mut cursor = Cursor::new(data);
        let header = Header::parse(&mut cursor)?;
        if options.require_layout_match && layout.len() != header.field_count as usize {
            return Err(Error::StructuralInconsistency(format!(
                "Layout has {} fields, but the table has {} columns",
                layout.len(),
                header.field_count
            )));
        }
        if header.record_size == 0 && header.record_count > 0 && !header.has_offset_map() {
            return Err(Error::StructuralInconsistency(
                "Fixed-size records declared with a record size of zero".to_string(),
            ));
        }

        let sections = SectionHeader::parse_all(&mut cursor, header.section_count)?;
        let (fields, columns) = column::parse_columns(&mut cursor, header.field_count)?;
        let expected_meta = header.field_count as usize * COLUMN_META_SIZE;
        if header.column_meta_size as usize != expected_meta {
            return Err(Error::StructuralInconsistency(format!(
                "Column metadata is declared as {} bytes, but {} columns need {}",
                header.column_meta_size, header.field_count, expected_meta
            )));
        }

        let start = cursor.position();
        let pallet = PalletData::parse(&mut cursor, &columns)?;
        region_size("pallet", cursor.position() - start, header.pallet_data_size)?;
        let start = cursor.position();
        let common = CommonData::parse(&mut cursor, &columns)?;
        region_size("common", cursor.position() - start, header.common_data_size)?;

        let mut builder = RecordStoreBuilder::new();
        let mut strings = StringTable::new();
        let mut bodies = Vec::with_capacity(sections.len());
        let mut previous_records = 0u32;
        let mut string_base = 0i64;
        let mut skipped_sections = 0;

        for (index, section) in sections.iter().enumerate() {
            let first_row = previous_records;
            previous_records = previous_records
                .checked_add(section.record_count)
                .ok_or_else(|| {
                    Error::StructuralInconsistency("Section record counts overflow".to_string())
                })?;
            let base = string_base;
            string_base += section.string_table_size as i64;

            if !options.key_available(section.tact_key_lookup) {
                tracing::warn!(
                    section = index,
                    key = format_args!("{:016X}", section.tact_key_lookup),
                    records = section.record_count,
                    "skipping section encrypted with an unavailable key"
                );
                skipped_sections += 1;
                continue;
            }

            let body = read_section(
                &mut cursor,
                &header,
                section,
                index,
                first_row,
                base,
                &mut strings,
                &mut builder,
            )?;
            tracing::debug!(
                section = index,
                records = section.record_count,
                index_entries = body.index_data.len(),
                sparse_entries = body.sparse_entries.len(),
                references = body.references.len(),
                copies = section.copy_table_count,
                "section read"
            );
            bodies.push(body);
        }

        let shared = Arc::new(TableShared {
            header,
            layout: layout.clone(),
            fields,
            columns,
            pallet,
            common,
            strings,
        });

        for body in &bodies {
            decode_rows(&shared, body, &mut builder)?;
        }
        tracing::debug!(rows = builder.len(), "rows decoded, applying copy table");
        let records = builder.finish()?;

        Ok(Table {
            shared,
            sections,
            skipped_sections,
            records,
        })
    }

    pub fn header(&self) -> &Header {
        &self.shared.header
    }

    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    /// Number of sections skipped because their encryption key wasn't available.
    pub fn skipped_sections(&self) -> usize {
        self.skipped_sections
    }

    pub fn layout(&self) -> &TableLayout {
        &self.shared.layout
    }

    pub fn field_meta(&self) -> &[FieldMeta] {
        &self.shared.fields
    }

    pub fn column_meta(&self) -> &[ColumnMeta] {
        &self.shared.columns
    }

    pub fn pallet(&self) -> &PalletData {
        &self.shared.pallet
    }

    pub fn common(&self) -> &CommonData {
        &self.shared.common
    }

    pub fn strings(&self) -> &StringTable {
        &self.shared.strings
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn into_records(self) -> RecordStore {
        self.records
    }

    pub fn get(&self, id: u32) -> Option<&Row> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn region_size(name: &str, read: usize, declared: u32) -> Result<()> {
    if read != declared as usize {
        return Err(Error::StructuralInconsistency(format!(
            "Column metadata describes {} bytes of {} data, but the header declares {}",
            read, name, declared
        )));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn read_section(
    cursor: &mut Cursor,
    header: &Header,
    section: &SectionHeader,
    index: usize,
    first_row: u32,
    string_base: i64,
    strings: &mut StringTable,
    builder: &mut RecordStoreBuilder,
) -> Result<SectionBody> {
    let file_offset = section.file_offset as usize;
    cursor.seek(file_offset, "seek to section")?;

    let records = if !header.has_offset_map() {
        let len = (section.record_count as usize)
            .checked_mul(header.record_size as usize)
            .ok_or_else(|| {
                Error::StructuralInconsistency(format!("Section {} is too large", index))
            })?;
        let records = cursor.bytes(len, "read records")?;
        let table = cursor.bytes(section.string_table_size as usize, "read string table")?;
        strings.add_region(string_base, table)?;
        records
    } else {
        let end = section.offset_records_end as usize;
        if end < file_offset {
            return Err(Error::StructuralInconsistency(format!(
                "Section {} sparse table starts at {}, before the section itself at {}",
                index, end, file_offset
            )));
        }
        let records = cursor.bytes(end - file_offset, "read sparse records")?;
        if cursor.position() != end {
            return Err(Error::StructuralInconsistency(format!(
                "Section {} records end at {}, not at the sparse table start {}",
                index,
                cursor.position(),
                end
            )));
        }
        records
    };
    let records = Arc::new(PaddedBytes::new(records));

    let mut index_data =
        cursor.u32_array(section.id_list_size as usize / 4, "read index data")?;

    let copy_count = section.copy_table_count as usize;
    cursor.ensure(copy_count, 8, "read copy table")?;
    for _ in 0..copy_count {
        let new_id = cursor.u32("read copy table")?;
        let source_id = cursor.u32("read copy table")?;
        builder.queue_copy(new_id, source_id);
    }

    let sparse_count = section.offset_map_id_count as usize;
    cursor.ensure(sparse_count, SPARSE_ENTRY_SIZE, "read sparse entries")?;
    let mut sparse_entries = Vec::with_capacity(sparse_count);
    for _ in 0..sparse_count {
        let offset = cursor.u32("read sparse entries")?;
        let size = cursor.u16("read sparse entries")?;
        let offset = offset.checked_sub(section.file_offset).ok_or_else(|| {
            Error::StructuralInconsistency(format!(
                "Section {} has a sparse record at {}, before the section start {}",
                index, offset, section.file_offset
            ))
        })?;
        sparse_entries.push(SparseEntry { offset, size });
    }

    let references = if section.relationship_data_size > 0 {
        ReferenceData::parse(cursor, section.relationship_data_size)?
    } else {
        ReferenceData::default()
    };

    if sparse_count > 0 {
        let sparse_ids = cursor.u32_array(sparse_count, "read sparse ids")?;
        if header.has_index_table() && !index_data.is_empty() && index_data.len() != sparse_ids.len()
        {
            return Err(Error::StructuralInconsistency(format!(
                "Section {} has {} index entries but {} sparse IDs",
                index,
                index_data.len(),
                sparse_ids.len()
            )));
        }
        index_data = sparse_ids;
    }

    if !index_data.is_empty() && index_data.len() != section.record_count as usize {
        return Err(Error::StructuralInconsistency(format!(
            "Section {} has {} records but {} index entries",
            index,
            section.record_count,
            index_data.len()
        )));
    }
    if header.has_offset_map() {
        if sparse_entries.len() != section.record_count as usize {
            return Err(Error::StructuralInconsistency(format!(
                "Section {} has {} records but {} sparse entries",
                index,
                section.record_count,
                sparse_entries.len()
            )));
        }
        if let Some(entry) = sparse_entries
            .iter()
            .find(|e| e.offset as usize + e.size as usize > records.len())
        {
            return Err(Error::StructuralInconsistency(format!(
                "Section {} sparse record at {} (size {}) runs past the {} record bytes",
                index,
                entry.offset,
                entry.size,
                records.len()
            )));
        }
    }

    Ok(SectionBody {
        index,
        record_count: section.record_count,
        first_row,
        records,
        index_data,
        sparse_entries,
        references,
    })
}

fn decode_rows(
    shared: &Arc<TableShared>,
    body: &SectionBody,
    builder: &mut RecordStoreBuilder,
) -> Result<()> {
    let header = &shared.header;
    let record_size = header.record_size as i64;
    let total_records = header.record_count as i64;
    let degenerate = body.index_is_degenerate();
    if degenerate {
        tracing::debug!(
            section = body.index,
            "index table is all zeros, numbering rows sequentially"
        );
    }

    for i in 0..body.record_count {
        let (bit_offset, bit_len) = if header.has_offset_map() {
            let entry = body.sparse_entries[i as usize];
            (entry.offset as usize * 8, entry.size as usize * 8)
        } else {
            let stride = header.record_size as usize * 8;
            (i as usize * stride, stride)
        };
        let record_offset =
            (body.first_row as i64 + i as i64) * record_size - total_records * record_size;
        let parent_id = body.references.parent_of(i);
        let id = if degenerate {
            Some(i)
        } else {
            body.index_data.get(i as usize).copied()
        };

        let row = Row::new(
            id.unwrap_or(NO_ID),
            parent_id,
            record_offset,
            bit_offset,
            bit_len,
            Arc::clone(&body.records),
            Arc::clone(shared),
        );
        let row = match id {
            Some(_) => row,
            None => {
                let id = row.value(header.id_index as usize)?.as_u32();
                row.resolved(id)
            }
        };
        builder.insert(row)?;
    }
    Ok(())
}
