use crate::progress::Progress;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use tally_protocol::ItemId;

/// Render-ready view of the session. Rebuilt on demand; holds no locks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub current_item_id: Option<ItemId>,
    pub qty_per_scan: u32,
    /// Scans accepted locally but not yet merged into confirmed state,
    /// per item. Absent key means zero.
    pub session_deltas: HashMap<ItemId, u32>,
    /// `confirmed + session delta` per count line. This is the only
    /// quantity a UI should render for an item.
    pub displayed_actual: HashMap<ItemId, u32>,
    pub is_persisting: bool,
    pub progress: Progress,
}

impl SessionSnapshot {
    pub fn delta(&self, item_id: ItemId) -> u32 {
        self.session_deltas.get(&item_id).copied().unwrap_or(0)
    }

    pub fn displayed(&self, item_id: ItemId) -> u32 {
        self.displayed_actual.get(&item_id).copied().unwrap_or(0)
    }
}
