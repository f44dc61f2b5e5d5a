//! The externally supplied shape of a table: one entry per column, giving the element type and
//! how many elements the column holds.
//!
//! The binary format doesn't describe what its columns mean. Consumers know which table they're
//! loading and provide the layout along with the bytes. Layouts are plain serde types, so they can
//! also live in a JSON or TOML definition file.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The scalar type stored in a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    /// A string: an offset into the string table, or an inline string in sparse records.
    String,
}

impl ElementType {
    /// Width of one element in an uncompressed record. Strings are stored as 32-bit offsets.
    pub fn bits(&self) -> u32 {
        match self {
            ElementType::U8 | ElementType::I8 => 8,
            ElementType::U16 | ElementType::I16 => 16,
            ElementType::U32 | ElementType::I32 | ElementType::F32 | ElementType::String => 32,
        }
    }
}

fn one() -> u32 {
    1
}

/// One column of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldLayout {
    #[serde(rename = "type")]
    pub ty: ElementType,
    /// Number of elements. Anything above 1 is an array column.
    #[serde(default = "one")]
    pub count: u32,
}

impl FieldLayout {
    pub fn scalar(ty: ElementType) -> Self {
        Self { ty, count: 1 }
    }

    pub fn array(ty: ElementType, count: u32) -> Self {
        Self { ty, count }
    }

    pub fn is_array(&self) -> bool {
        self.count > 1
    }
}

/// The ordered columns of a table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableLayout {
    fields: Vec<FieldLayout>,
}

impl TableLayout {
    pub fn new(fields: Vec<FieldLayout>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, column: usize) -> Result<&FieldLayout> {
        self.fields.get(column).ok_or(Error::ColumnOutOfRange {
            column,
            count: self.fields.len(),
        })
    }
}

impl FromIterator<FieldLayout> for TableLayout {
    fn from_iter<I: IntoIterator<Item = FieldLayout>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_json() {
        let layout: TableLayout = serde_json::from_str(
            r#"[
                {"type": "u32"},
                {"type": "string"},
                {"type": "f32", "count": 3},
                {"type": "i16"}
            ]"#,
        )
        .unwrap();
        assert_eq!(layout.len(), 4);
        assert_eq!(layout.field(0).unwrap(), &FieldLayout::scalar(ElementType::U32));
        assert_eq!(layout.field(2).unwrap(), &FieldLayout::array(ElementType::F32, 3));
        assert!(layout.field(2).unwrap().is_array());
        assert_eq!(layout.field(3).unwrap().ty, ElementType::I16);
        assert!(layout.field(4).is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let res: Result<TableLayout, _> =
            serde_json::from_str(r#"[{"type": "u8", "width": 3}]"#);
        assert!(res.is_err());
    }

    #[test]
    fn element_widths() {
        assert_eq!(ElementType::I8.bits(), 8);
        assert_eq!(ElementType::U16.bits(), 16);
        assert_eq!(ElementType::String.bits(), 32);
    }
}
