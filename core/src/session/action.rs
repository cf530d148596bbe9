use serde::Deserialize;
use serde::Serialize;
use tally_protocol::ItemId;

/// User intent dispatched into the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionAction {
    ItemSelected { item_id: ItemId },
    ScanDetected { code: String },
    SetQtyPerScan { qty: u32 },
    /// Manual override of the current item's actual quantity.
    SetActual { quantity: u32 },
}
