//! A decoder for versioned, compressed, columnar client data tables (the `WDC3` format).
//!
//! Client data tables ship structured reference data as opaque binary blobs. Each file holds a
//! fixed header, one or more sections of records, and column metadata describing how each
//! column is stored:
//!
//! - Bit-packed directly in the record ("immediate"), optionally signed
//! - As an index into a shared, column-wide block of values ("pallet")
//! - As an index to the first of several consecutive pallet values ("pallet array")
//! - As a per-row-ID override on a column default ("common")
//!
//! Records are either fixed-size with a string table per section, or variable-size, located
//! through an offset map, with strings inlined. Rows whose data is identical to another row are
//! stored once and recreated through a copy table. Sections encrypted with a key the caller
//! doesn't have are skipped without disturbing the numbering of rows in later sections.
//!
//! The format doesn't describe what its columns mean, so loading takes a [`TableLayout`] naming
//! each column's element type and count:
//!
//! ```no_run
//! # fn main() -> db2_table::Result<()> {
//! use db2_table::{ElementType, FieldLayout, LoadOptions, Table, TableLayout};
//!
//! let layout: TableLayout = vec![
//!     FieldLayout::scalar(ElementType::U32),
//!     FieldLayout::scalar(ElementType::String),
//!     FieldLayout::array(ElementType::F32, 3),
//! ]
//! .into_iter()
//! .collect();
//! let bytes = std::fs::read("Map.db2")?;
//! let table = Table::load(&bytes, &layout, &LoadOptions::default())?;
//! for row in table.records() {
//!     let name = row.string(1)?;
//!     let position: Vec<f32> = row.get_array(2)?;
//!     println!("{}: {} at {:?}", row.id(), name, position);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A loaded [`Table`] is immutable. Its [`RecordStore`] and [`Row`]s can be shared freely across
//! threads; reloading means loading a fresh `Table`.

mod bits;
mod column;
mod cursor;
mod error;
mod header;
mod layout;
mod options;
mod reference;
mod row;
mod section;
mod shared;
mod store;
mod strings;
mod table;
mod value;

#[cfg(test)]
mod test_util;

pub use bits::{BitReader, PaddedBytes, PADDING};
pub use column::{ColumnMeta, Compression, CompressionType, FieldMeta};
pub use error::{Error, Result};
pub use header::{
    Header, FLAG_INDEX_TABLE, FLAG_OFFSET_MAP, FLAG_SECONDARY_KEY, HEADER_SIZE, SIGNATURE,
};
pub use layout::{ElementType, FieldLayout, TableLayout};
pub use options::LoadOptions;
pub use reference::ReferenceData;
pub use row::Row;
pub use section::{SectionHeader, SECTION_HEADER_SIZE};
pub use shared::{CommonData, PalletData};
pub use store::RecordStore;
pub use strings::StringTable;
pub use table::{SparseEntry, Table};
pub use value::{FieldType, Value32};
