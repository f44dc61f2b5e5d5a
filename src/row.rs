//! Decoded rows and typed field extraction.
//!
//! A [`Row`] doesn't copy its fields out of the record data. It keeps a reference to its
//! section's record bytes plus the table-wide column metadata, and decodes a field each time one
//! is requested. Every read dispatches on the column's compression:
//!
//! - `None` / `Immediate`: the bits live in the record at the column's bit offset.
//! - `Pallet`: the record holds an index into the column's pallet block.
//! - `PalletArray`: the index selects the first of `cardinality` consecutive pallet values.
//! - `Common`: the value is looked up by row ID, with a per-column default.
//!
//! Sparse (offset-map) records are variable-length and carry their strings inline, so their
//! fields are found by walking the record from the start using the table layout's element types.

use std::fmt;
use std::sync::Arc;

use crate::bits::{BitReader, PaddedBytes};
use crate::column::{ColumnMeta, Compression, FieldMeta};
use crate::error::{Error, Result};
use crate::layout::{ElementType, FieldLayout};
use crate::table::TableShared;
use crate::value::{FieldType, Value32};

fn pallet_in_sparse(column: usize) -> Error {
    Error::TypeMismatch {
        column,
        reason: "pallet columns can't appear in sparse records",
    }
}

/// One decoded record.
#[derive(Clone)]
pub struct Row {
    id: u32,
    /// ID the field data was decoded under. Common columns are looked up by this, so a copy
    /// reads the same values as its source.
    data_id: u32,
    parent_id: Option<u32>,
    /// Signed byte offset of this row relative to the end of all records. Added to a string
    /// field's position and value, it gives the string's key in the string table.
    record_offset: i64,
    /// Bit offset of the row within `data`.
    bit_offset: usize,
    /// Length of the row in bits. Reads never cross it.
    bit_len: usize,
    data: Arc<PaddedBytes>,
    table: Arc<TableShared>,
}

impl Row {
    pub(crate) fn new(
        id: u32,
        parent_id: Option<u32>,
        record_offset: i64,
        bit_offset: usize,
        bit_len: usize,
        data: Arc<PaddedBytes>,
        table: Arc<TableShared>,
    ) -> Row {
        Row {
            id,
            data_id: id,
            parent_id,
            record_offset,
            bit_offset,
            bit_len,
            data,
            table,
        }
    }

    /// This row with its ID resolved, for rows whose ID is read from a column.
    pub(crate) fn resolved(&self, id: u32) -> Row {
        Row {
            id,
            data_id: id,
            ..self.clone()
        }
    }

    /// A copy of this row's field data under a different ID.
    pub(crate) fn with_id(&self, id: u32) -> Row {
        Row { id, ..self.clone() }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// ID of the parent record this row references, if the section had reference data for it.
    pub fn parent_id(&self) -> Option<u32> {
        self.parent_id
    }

    pub fn record_offset(&self) -> i64 {
        self.record_offset
    }

    /// Number of columns each row has.
    pub fn field_count(&self) -> usize {
        self.table.columns.len()
    }

    fn sparse(&self) -> bool {
        self.table.header.has_offset_map()
    }

    fn column(&self, column: usize) -> Result<(&ColumnMeta, &FieldMeta, &FieldLayout)> {
        let count = self.table.columns.len();
        let out_of_range = || Error::ColumnOutOfRange { column, count };
        let meta = self.table.columns.get(column).ok_or_else(out_of_range)?;
        let field = self.table.fields.get(column).ok_or_else(out_of_range)?;
        let layout = self.table.layout.field(column)?;
        Ok((meta, field, layout))
    }

    fn reader_at(&self, position: usize) -> BitReader {
        let mut reader = BitReader::bounded(&self.data, self.bit_offset, self.bit_len);
        reader.set_position(position);
        reader
    }

    /// Width of one uncompressed element. The field metadata holds it for anything up to 32 bits;
    /// otherwise the column's bit size is split evenly among the elements.
    fn element_width(meta: &ColumnMeta, field: &FieldMeta, layout: &FieldLayout) -> u32 {
        field
            .bit_width()
            .unwrap_or(meta.field_size_bits as u32 / layout.count.max(1))
    }

    /// Position a reader at the start of `column` in a sparse record by stepping over every
    /// earlier field.
    fn sparse_reader(&self, column: usize) -> Result<BitReader> {
        let mut reader = self.reader_at(0);
        for c in 0..column {
            let (meta, _, layout) = self.column(c)?;
            self.skip_inline(&mut reader, c, meta, layout)?;
        }
        Ok(reader)
    }

    fn skip_inline(
        &self,
        reader: &mut BitReader,
        column: usize,
        meta: &ColumnMeta,
        layout: &FieldLayout,
    ) -> Result<()> {
        match meta.compression {
            Compression::None | Compression::Immediate { .. } => {
                for _ in 0..layout.count {
                    if layout.ty == ElementType::String {
                        reader.read_cstr()?;
                    } else {
                        reader.read_value(layout.ty.bits())?;
                    }
                }
                Ok(())
            }
            Compression::Common { .. } => Ok(()),
            Compression::Pallet { .. } | Compression::PalletArray { .. } => {
                Err(pallet_in_sparse(column))
            }
        }
    }

    /// Read one element stored inline in a sparse record.
    fn read_inline(
        &self,
        reader: &mut BitReader,
        column: usize,
        meta: &ColumnMeta,
        width: u32,
    ) -> Result<Value32> {
        match meta.compression {
            Compression::None | Compression::Immediate { signed: false, .. } => {
                Ok(Value32::from(reader.read_value(width)?))
            }
            Compression::Immediate { signed: true, .. } => {
                Ok(Value32::from(reader.read_signed(width)?))
            }
            Compression::Common { default } => Ok(self.common_value(column, default)),
            Compression::Pallet { .. } | Compression::PalletArray { .. } => {
                Err(pallet_in_sparse(column))
            }
        }
    }

    fn check_sparse_readable(
        &self,
        column: usize,
        meta: &ColumnMeta,
        layout: &FieldLayout,
    ) -> Result<()> {
        if layout.ty == ElementType::String {
            return Err(Error::TypeMismatch {
                column,
                reason: "sparse string fields are only readable as strings",
            });
        }
        if meta.compression.uses_pallet() {
            return Err(pallet_in_sparse(column));
        }
        Ok(())
    }

    fn common_value(&self, column: usize, default: Value32) -> Value32 {
        self.table.common.get(column, self.data_id).unwrap_or(default)
    }

    fn immediate(reader: &mut BitReader, bit_width: u32, signed: bool) -> Result<Value32> {
        if signed {
            Ok(Value32::from(reader.read_signed(bit_width)?))
        } else {
            Ok(Value32::from(reader.read_value(bit_width)?))
        }
    }

    /// Read a column's single value as an untyped 32-bit word.
    ///
    /// For string columns of fixed-size records this is the raw string offset.
    pub fn value(&self, column: usize) -> Result<Value32> {
        let (meta, field, layout) = self.column(column)?;
        match meta.compression {
            Compression::Common { default } => Ok(self.common_value(column, default)),
            _ if self.sparse() => {
                self.check_sparse_readable(column, meta, layout)?;
                let mut reader = self.sparse_reader(column)?;
                self.read_inline(&mut reader, column, meta, layout.ty.bits())
            }
            Compression::None => {
                let width = Self::element_width(meta, field, layout);
                let mut reader = self.reader_at(meta.field_offset_bits as usize);
                Ok(Value32::from(reader.read_value(width)?))
            }
            Compression::Immediate {
                bit_width, signed, ..
            } => {
                let mut reader = self.reader_at(meta.field_offset_bits as usize);
                Self::immediate(&mut reader, bit_width, signed)
            }
            Compression::Pallet { bit_width, .. } => {
                let mut reader = self.reader_at(meta.field_offset_bits as usize);
                let index = reader.read_value(bit_width)?;
                Ok(self.table.pallet.lookup(column, index, 1)?[0])
            }
            Compression::PalletArray {
                bit_width,
                cardinality,
                ..
            } => {
                if cardinality != 1 {
                    return Err(Error::TypeMismatch {
                        column,
                        reason: "pallet array column holds more than one value",
                    });
                }
                let mut reader = self.reader_at(meta.field_offset_bits as usize);
                let index = reader.read_value(bit_width)?;
                Ok(self.table.pallet.lookup(column, index, 1)?[0])
            }
        }
    }

    /// Read every value of a column as untyped 32-bit words. Scalar columns give one value.
    pub fn values(&self, column: usize) -> Result<Vec<Value32>> {
        let (meta, field, layout) = self.column(column)?;
        match meta.compression {
            Compression::Common { default } => {
                if layout.is_array() {
                    return Err(Error::TypeMismatch {
                        column,
                        reason: "common columns hold a single value",
                    });
                }
                Ok(vec![self.common_value(column, default)])
            }
            Compression::Pallet { .. } => {
                if layout.is_array() {
                    return Err(Error::TypeMismatch {
                        column,
                        reason: "pallet columns hold a single value",
                    });
                }
                Ok(vec![self.value(column)?])
            }
            _ if self.sparse() => {
                self.check_sparse_readable(column, meta, layout)?;
                let mut reader = self.sparse_reader(column)?;
                (0..layout.count)
                    .map(|_| self.read_inline(&mut reader, column, meta, layout.ty.bits()))
                    .collect()
            }
            Compression::None => {
                let width = Self::element_width(meta, field, layout);
                let mut reader = self.reader_at(meta.field_offset_bits as usize);
                (0..layout.count)
                    .map(|_| Ok(Value32::from(reader.read_value(width)?)))
                    .collect()
            }
            Compression::Immediate {
                bit_width, signed, ..
            } => {
                let mut reader = self.reader_at(meta.field_offset_bits as usize);
                (0..layout.count)
                    .map(|_| Self::immediate(&mut reader, bit_width, signed))
                    .collect()
            }
            Compression::PalletArray {
                bit_width,
                cardinality,
                ..
            } => {
                let mut reader = self.reader_at(meta.field_offset_bits as usize);
                let index = reader.read_value(bit_width)?;
                Ok(self.table.pallet.lookup(column, index, cardinality)?.to_vec())
            }
        }
    }

    fn check_width<T: FieldType>(&self, column: usize) -> Result<()> {
        let (_, _, layout) = self.column(column)?;
        if layout.ty == ElementType::String {
            return Err(Error::TypeMismatch {
                column,
                reason: "string columns are read with `string`",
            });
        }
        if layout.ty.bits() != T::BITS {
            return Err(Error::TypeMismatch {
                column,
                reason: "requested type width doesn't match the column's element width",
            });
        }
        Ok(())
    }

    /// Read a column's value reinterpreted as `T`. `T` must have the column's element width.
    pub fn get<T: FieldType>(&self, column: usize) -> Result<T> {
        self.check_width::<T>(column)?;
        Ok(T::from_value(self.value(column)?))
    }

    /// Read every value of a column reinterpreted as `T`.
    pub fn get_array<T: FieldType>(&self, column: usize) -> Result<Vec<T>> {
        self.check_width::<T>(column)?;
        Ok(self
            .values(column)?
            .into_iter()
            .map(T::from_value)
            .collect())
    }

    fn lookup_string(&self, column: usize, field_byte: usize, raw: Value32) -> Result<&str> {
        let key = self.record_offset + field_byte as i64 + raw.as_u32() as i64;
        self.table
            .strings
            .get(key)
            .ok_or(Error::MissingString { column, key })
    }

    fn check_string(&self, column: usize) -> Result<()> {
        let (_, _, layout) = self.column(column)?;
        if layout.ty != ElementType::String {
            return Err(Error::TypeMismatch {
                column,
                reason: "column doesn't hold strings",
            });
        }
        Ok(())
    }

    /// Read a string column.
    pub fn string(&self, column: usize) -> Result<&str> {
        self.check_string(column)?;
        if self.sparse() {
            return self.sparse_reader(column)?.read_cstr();
        }
        let (meta, _, _) = self.column(column)?;
        let raw = self.value(column)?;
        self.lookup_string(column, meta.field_offset_bits as usize >> 3, raw)
    }

    /// Read every string of a string array column.
    pub fn strings(&self, column: usize) -> Result<Vec<&str>> {
        self.check_string(column)?;
        let (meta, _, layout) = self.column(column)?;
        if self.sparse() {
            let mut reader = self.sparse_reader(column)?;
            return (0..layout.count).map(|_| reader.read_cstr()).collect();
        }
        let start = meta.field_offset_bits as usize >> 3;
        self.values(column)?
            .into_iter()
            .enumerate()
            .map(|(i, raw)| self.lookup_string(column, start + i * 4, raw))
            .collect()
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("record_offset", &self.record_offset)
            .field("bit_offset", &self.bit_offset)
            .field("bit_len", &self.bit_len)
            .finish()
    }
}
