//! Element index: element id -> owning signal id
//!
//! Every mention added to a signal, and every nested container its
//! annotations carry, is registered here against the top-level signal. A
//! later mention that only knows the id of such a nested container resolves
//! back to the signal through this map.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ElementIndex {
    owners: HashMap<String, String>,
}

impl ElementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` as owned by `owner_signal_id`; re-registering overwrites
    pub fn register(&mut self, id: impl Into<String>, owner_signal_id: impl Into<String>) {
        self.owners.insert(id.into(), owner_signal_id.into());
    }

    /// Owning signal id of `id`, if registered
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.owners.get(id).map(String::as_str)
    }

    /// Forget all entries; ids are only unique within one scenario
    pub fn clear(&mut self) {
        self.owners.clear();
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
