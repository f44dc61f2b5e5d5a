use std::collections::HashMap;

use crate::cursor::Cursor;
use crate::error::{Error, Result};

/// A section's parent references: in-section row index to parent record ID.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub min_id: u32,
    pub max_id: u32,
    entries: HashMap<u32, u32>,
}

impl ReferenceData {
    /// Read a reference block: entry count, ID range, then `(parent_id, row_index)` pairs.
    /// `size` is the block size the section declared.
    pub(crate) fn parse(cursor: &mut Cursor, size: u32) -> Result<ReferenceData> {
        let start = cursor.position();
        let step = "read reference data";
        let count = cursor.u32(step)?;
        let min_id = cursor.u32(step)?;
        let max_id = cursor.u32(step)?;
        cursor.ensure(count as usize, 8, step)?;
        let mut entries = HashMap::with_capacity(count as usize);
        for _ in 0..count {
            let parent_id = cursor.u32(step)?;
            let row_index = cursor.u32(step)?;
            entries.insert(row_index, parent_id);
        }
        let read = cursor.position() - start;
        if read > size as usize {
            return Err(Error::StructuralInconsistency(format!(
                "Reference data holds {} entries ({} bytes), but the section declares {} bytes",
                count, read, size
            )));
        }
        // Anything the block declares past its entries is unused.
        cursor.seek(start + size as usize, step)?;
        Ok(ReferenceData {
            min_id,
            max_id,
            entries,
        })
    }

    /// Parent ID of the row at `index` within its section.
    pub fn parent_of(&self, index: u32) -> Option<u32> {
        self.entries.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
