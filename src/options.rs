use std::collections::BTreeSet;

use educe::Educe;
use serde::{Deserialize, Serialize};

/// Settings for loading a table.
#[derive(Clone, Debug, PartialEq, Eq, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct LoadOptions {
    /// Lookups of the encryption keys the caller can read. A section encrypted under any other
    /// key is skipped, though its rows still count toward row numbering.
    pub known_keys: BTreeSet<u64>,
    /// Fail the load when the supplied layout doesn't have exactly one entry per column.
    #[educe(Default = true)]
    pub require_layout_match: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key lookup as available.
    pub fn with_key(mut self, lookup: u64) -> Self {
        self.known_keys.insert(lookup);
        self
    }

    pub fn key_available(&self, lookup: u64) -> bool {
        lookup == 0 || self.known_keys.contains(&lookup)
    }
}
