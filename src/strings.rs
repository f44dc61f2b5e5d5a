use std::collections::HashMap;

use crate::error::{Error, Result};

/// Strings from every section's string table, keyed by byte offset from the start of the logical
/// string region (all sections' tables laid end to end, in section order).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: HashMap<i64, Box<str>>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one section's string table. `base` is where the table starts within the logical region.
    pub(crate) fn add_region(&mut self, base: i64, region: &[u8]) -> Result<()> {
        self.strings.reserve(bytecount::count(region, 0));
        let mut pos = 0;
        while pos < region.len() {
            let rest = &region[pos..];
            let len = rest.iter().position(|&b| b == 0).ok_or_else(|| {
                Error::BadString(format!(
                    "String at offset {} runs past the end of its table",
                    base + pos as i64
                ))
            })?;
            let s = std::str::from_utf8(&rest[..len]).map_err(|e| {
                Error::BadString(format!(
                    "String at offset {} isn't UTF-8: {}",
                    base + pos as i64,
                    e
                ))
            })?;
            self.strings.insert(base + pos as i64, s.into());
            pos += len + 1;
        }
        Ok(())
    }

    pub fn get(&self, key: i64) -> Option<&str> {
        self.strings.get(&key).map(|s| &**s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
