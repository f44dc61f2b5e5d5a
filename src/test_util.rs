//! Builds table files for tests. The decoder never writes tables, so this only exists to produce
//! known inputs.

use crate::column::{ColumnMeta, Compression, CompressionType, FieldMeta, COLUMN_META_SIZE};
use crate::header::{Header, FLAG_INDEX_TABLE, FLAG_OFFSET_MAP, HEADER_SIZE, SIGNATURE};
use crate::section::SECTION_HEADER_SIZE;

/// Write `width` bits of `value` into `buf` starting at `bit`, least significant bit first.
pub fn put_bits(buf: &mut [u8], bit: usize, width: u32, value: u32) {
    for i in 0..width as usize {
        let b = bit + i;
        if (value >> i) & 1 != 0 {
            buf[b >> 3] |= 1 << (b & 7);
        } else {
            buf[b >> 3] &= !(1 << (b & 7));
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColumnDef {
    pub field: FieldMeta,
    pub meta: ColumnMeta,
    pub pallet: Vec<u32>,
    pub common: Vec<(u32, u32)>,
}

impl ColumnDef {
    fn plain(offset_bits: u16, size_bits: u16, compression: Compression) -> Self {
        ColumnDef {
            field: FieldMeta {
                size: 32 - size_bits.min(32) as i16,
                offset: offset_bits / 8,
            },
            meta: ColumnMeta {
                field_offset_bits: offset_bits,
                field_size_bits: size_bits,
                additional_data_size: 0,
                compression,
            },
            pallet: Vec::new(),
            common: Vec::new(),
        }
    }

    /// An uncompressed field of `bits` bits.
    pub fn none(offset_bits: u16, bits: u16) -> Self {
        Self::plain(offset_bits, bits, Compression::None)
    }

    /// An uncompressed array of `count` elements of `elem_bits` bits each.
    pub fn none_array(offset_bits: u16, elem_bits: u16, count: u16) -> Self {
        let mut col = Self::plain(offset_bits, elem_bits * count, Compression::None);
        col.field.size = 32 - elem_bits as i16;
        col
    }

    pub fn immediate(offset_bits: u16, width: u16, signed: bool) -> Self {
        Self::plain(
            offset_bits,
            width,
            Compression::Immediate {
                bit_offset: offset_bits as u32,
                bit_width: width as u32,
                signed,
            },
        )
    }

    pub fn pallet(offset_bits: u16, width: u16, values: &[u32]) -> Self {
        let mut col = Self::plain(
            offset_bits,
            width,
            Compression::Pallet {
                bit_offset: offset_bits as u32,
                bit_width: width as u32,
            },
        );
        col.meta.additional_data_size = values.len() as u32 * 4;
        col.pallet = values.to_vec();
        col
    }

    pub fn pallet_array(offset_bits: u16, width: u16, cardinality: u32, values: &[u32]) -> Self {
        let mut col = Self::plain(
            offset_bits,
            width,
            Compression::PalletArray {
                bit_offset: offset_bits as u32,
                bit_width: width as u32,
                cardinality,
            },
        );
        col.meta.additional_data_size = values.len() as u32 * 4;
        col.pallet = values.to_vec();
        col
    }

    pub fn common(default: u32, entries: &[(u32, u32)]) -> Self {
        let mut col = Self::plain(
            0,
            0,
            Compression::Common {
                default: default.into(),
            },
        );
        col.meta.additional_data_size = entries.len() as u32 * 8;
        col.common = entries.to_vec();
        col
    }

    fn encode_field(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.field.size.to_le_bytes());
        buf.extend_from_slice(&self.field.offset.to_le_bytes());
    }

    fn encode_meta(&self, buf: &mut Vec<u8>) {
        let m = &self.meta;
        let (args, kind) = match m.compression {
            Compression::None => ([0, 0, 0], CompressionType::None),
            Compression::Immediate {
                bit_offset,
                bit_width,
                signed,
            } => (
                [bit_offset, bit_width, signed as u32],
                CompressionType::Immediate,
            ),
            Compression::Common { default } => ([default.as_u32(), 0, 0], CompressionType::Common),
            Compression::Pallet {
                bit_offset,
                bit_width,
            } => ([bit_offset, bit_width, 0], CompressionType::Pallet),
            Compression::PalletArray {
                bit_offset,
                bit_width,
                cardinality,
            } => (
                [bit_offset, bit_width, cardinality],
                CompressionType::PalletArray,
            ),
        };
        let start = buf.len();
        buf.extend_from_slice(&m.field_offset_bits.to_le_bytes());
        buf.extend_from_slice(&m.field_size_bits.to_le_bytes());
        buf.extend_from_slice(&m.additional_data_size.to_le_bytes());
        buf.extend_from_slice(&u32::from(kind).to_le_bytes());
        for a in args {
            buf.extend_from_slice(&a.to_le_bytes());
        }
        debug_assert_eq!(buf.len() - start, COLUMN_META_SIZE);
    }
}

#[derive(Clone, Debug, Default)]
pub struct SectionDef {
    pub key: u64,
    pub record_count: u32,
    /// Fixed mode: `record_count * record_size` bytes. Sparse mode: the records back to back.
    pub records: Vec<u8>,
    pub strings: Vec<u8>,
    pub index: Vec<u32>,
    pub copies: Vec<(u32, u32)>,
    /// `(offset from section start, size)`.
    pub sparse: Vec<(u32, u16)>,
    pub sparse_ids: Vec<u32>,
    /// `(min_id, max_id, [(parent_id, row_index)])`.
    pub references: Option<(u32, u32, Vec<(u32, u32)>)>,
}

impl SectionDef {
    /// Fixed-size records, given as one byte vector per row.
    pub fn fixed(rows: &[Vec<u8>]) -> Self {
        SectionDef {
            record_count: rows.len() as u32,
            records: rows.concat(),
            ..Default::default()
        }
    }

    /// Variable-size records, given as one byte vector per row.
    pub fn sparse(rows: &[Vec<u8>], ids: &[u32]) -> Self {
        let mut records = Vec::new();
        let mut sparse = Vec::new();
        for row in rows {
            sparse.push((records.len() as u32, row.len() as u16));
            records.extend_from_slice(row);
        }
        SectionDef {
            record_count: rows.len() as u32,
            records,
            sparse,
            sparse_ids: ids.to_vec(),
            ..Default::default()
        }
    }

    pub fn strings(mut self, strings: &[u8]) -> Self {
        self.strings = strings.to_vec();
        self
    }

    pub fn index(mut self, ids: &[u32]) -> Self {
        self.index = ids.to_vec();
        self
    }

    pub fn copies(mut self, copies: &[(u32, u32)]) -> Self {
        self.copies = copies.to_vec();
        self
    }

    pub fn key(mut self, key: u64) -> Self {
        self.key = key;
        self
    }

    fn reference_size(&self) -> u32 {
        self.references
            .as_ref()
            .map_or(0, |(_, _, pairs)| 12 + 8 * pairs.len() as u32)
    }
}

#[derive(Clone, Debug)]
pub struct TableFileBuilder {
    record_size: u32,
    flags: u16,
    id_index: u16,
    columns: Vec<ColumnDef>,
    sections: Vec<SectionDef>,
}

impl TableFileBuilder {
    pub fn fixed(record_size: u32) -> Self {
        TableFileBuilder {
            record_size,
            flags: 0,
            id_index: 0,
            columns: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn sparse() -> Self {
        TableFileBuilder {
            flags: FLAG_OFFSET_MAP,
            ..Self::fixed(0)
        }
    }

    pub fn index_table(mut self) -> Self {
        self.flags |= FLAG_INDEX_TABLE;
        self
    }

    pub fn id_index(mut self, column: u16) -> Self {
        self.id_index = column;
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn section(mut self, section: SectionDef) -> Self {
        self.sections.push(section);
        self
    }

    fn section_mut(&mut self, section: usize) -> &mut SectionDef {
        &mut self.sections[section]
    }

    /// Replace the copy table of an already added section.
    pub fn section_copies(mut self, section: usize, copies: &[(u32, u32)]) -> Self {
        self.section_mut(section).copies = copies.to_vec();
        self
    }

    pub fn section_index(mut self, section: usize, ids: &[u32]) -> Self {
        self.section_mut(section).index = ids.to_vec();
        self
    }

    pub fn section_references(
        mut self,
        section: usize,
        min: u32,
        max: u32,
        pairs: &[(u32, u32)],
    ) -> Self {
        self.section_mut(section).references = Some((min, max, pairs.to_vec()));
        self
    }

    pub fn header(&self) -> Header {
        Header {
            signature: SIGNATURE,
            record_count: self.sections.iter().map(|s| s.record_count).sum(),
            field_count: self.columns.len() as u32,
            record_size: self.record_size,
            string_table_size: self.sections.iter().map(|s| s.strings.len() as u32).sum(),
            table_hash: 0x1234_5678,
            layout_hash: 0x9abc_def0,
            min_id: 0,
            max_id: 0,
            locale: 0,
            flags: self.flags,
            id_index: self.id_index,
            total_field_count: self.columns.len() as u32,
            bitpacked_data_offset: 0,
            lookup_column_count: 0,
            column_meta_size: (self.columns.len() * COLUMN_META_SIZE) as u32,
            common_data_size: self
                .columns
                .iter()
                .map(|c| c.common.len() as u32 * 8)
                .sum(),
            pallet_data_size: self
                .columns
                .iter()
                .map(|c| c.pallet.len() as u32 * 4)
                .sum(),
            section_count: self.sections.len() as u32,
        }
    }

    fn encode_header(h: &Header, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&h.signature);
        for v in [
            h.record_count,
            h.field_count,
            h.record_size,
            h.string_table_size,
            h.table_hash,
            h.layout_hash,
            h.min_id,
            h.max_id,
            h.locale,
        ] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&h.flags.to_le_bytes());
        buf.extend_from_slice(&h.id_index.to_le_bytes());
        for v in [
            h.total_field_count,
            h.bitpacked_data_offset,
            h.lookup_column_count,
            h.column_meta_size,
            h.common_data_size,
            h.pallet_data_size,
            h.section_count,
        ] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        debug_assert_eq!(buf.len(), HEADER_SIZE);
    }

    fn encode_body(&self, s: &SectionDef, file_offset: u32, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&s.records);
        if self.flags & FLAG_OFFSET_MAP == 0 {
            buf.extend_from_slice(&s.strings);
        }
        for id in &s.index {
            buf.extend_from_slice(&id.to_le_bytes());
        }
        for (new_id, source) in &s.copies {
            buf.extend_from_slice(&new_id.to_le_bytes());
            buf.extend_from_slice(&source.to_le_bytes());
        }
        for (offset, size) in &s.sparse {
            buf.extend_from_slice(&(offset + file_offset).to_le_bytes());
            buf.extend_from_slice(&size.to_le_bytes());
        }
        if let Some((min, max, pairs)) = &s.references {
            buf.extend_from_slice(&(pairs.len() as u32).to_le_bytes());
            buf.extend_from_slice(&min.to_le_bytes());
            buf.extend_from_slice(&max.to_le_bytes());
            for (parent, index) in pairs {
                buf.extend_from_slice(&parent.to_le_bytes());
                buf.extend_from_slice(&index.to_le_bytes());
            }
        }
        if !s.sparse.is_empty() {
            for id in &s.sparse_ids {
                buf.extend_from_slice(&id.to_le_bytes());
            }
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let header = self.header();
        let mut prelude = Vec::new();
        for c in &self.columns {
            c.encode_field(&mut prelude);
        }
        for c in &self.columns {
            c.encode_meta(&mut prelude);
        }
        for c in &self.columns {
            for v in &c.pallet {
                prelude.extend_from_slice(&v.to_le_bytes());
            }
        }
        for c in &self.columns {
            for (id, v) in &c.common {
                prelude.extend_from_slice(&id.to_le_bytes());
                prelude.extend_from_slice(&v.to_le_bytes());
            }
        }

        // Lay out the section bodies first so each descriptor knows its offset.
        let mut offset = (HEADER_SIZE + self.sections.len() * SECTION_HEADER_SIZE + prelude.len())
            as u32;
        let mut descriptors = Vec::new();
        let mut bodies = Vec::new();
        for s in &self.sections {
            let mut body = Vec::new();
            self.encode_body(s, offset, &mut body);
            descriptors.extend_from_slice(&s.key.to_le_bytes());
            for v in [
                offset,
                s.record_count,
                s.strings.len() as u32,
                offset + s.records.len() as u32,
                s.index.len() as u32 * 4,
                s.reference_size(),
                s.sparse.len() as u32,
                s.copies.len() as u32,
            ] {
                descriptors.extend_from_slice(&v.to_le_bytes());
            }
            offset += body.len() as u32;
            bodies.extend(body);
        }

        let mut buf = Vec::new();
        Self::encode_header(&header, &mut buf);
        buf.extend(descriptors);
        buf.extend(prelude);
        buf.extend(bodies);
        buf
    }
}

/// Build one fixed-size record by packing `(bit_offset, width, value)` triples.
pub fn record(size: usize, fields: &[(usize, u32, u32)]) -> Vec<u8> {
    let mut buf = vec![0u8; size];
    for &(bit, width, value) in fields {
        put_bits(&mut buf, bit, width, value);
    }
    buf
}

#[test]
fn put_bits_packs_lsb_first() {
    let rec = record(2, &[(0, 3, 0b101), (3, 9, 0x1ff)]);
    assert_eq!(rec, vec![0b1111_1101, 0b0000_1111]);
}
